//! Keyboard input for the capture trigger.
//!
//! This module provides:
//! - Key identifiers (`KeyCode`) and the `KeySource` sampling abstraction
//! - Rising-edge detection (`KeyEdgeDetector`)
//! - A listener-fed shared flag (`SharedKeyState`)
//! - A `GetAsyncKeyState` poller on Windows (`AsyncKeyPoller`)

pub mod edge;
#[cfg(windows)]
pub mod keyboard;
pub mod keys;

pub use edge::{EdgeState, KeyEdgeDetector};
#[cfg(windows)]
pub use keyboard::AsyncKeyPoller;
pub use keys::{KeyCode, KeySource, SharedKeyState};
