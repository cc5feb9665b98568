//! Card pick capture library.
//!
//! This crate provides:
//! - Region capture and grayscale cropping (`capture`)
//! - Trigger key sampling and edge detection (`input`)
//! - Numbered session directories with atomic frame pairs (`session`)
//! - The polling capture loop (`runner`)
//! - Config loading, logging and paths for the binary

pub mod capture;
pub mod config;
pub mod error;
pub mod input;
pub mod logger;
pub mod paths;
pub mod runner;
pub mod session;
