//! Screen region capture.
//!
//! This module provides:
//! - Validated capture regions (`CaptureRegion`, `RegionPair`)
//! - The `ScreenSource` abstraction and `RegionCapturer`
//! - A GDI full-screen source on Windows (`GdiScreen`)

pub mod capturer;
pub mod region;
#[cfg(windows)]
pub mod screenshot;

pub use capturer::{RegionCapturer, ScreenSource};
pub use region::{crop_grayscale, CaptureRegion, Rect, RegionPair, Role};
#[cfg(windows)]
pub use screenshot::{enable_dpi_awareness, GdiScreen};
