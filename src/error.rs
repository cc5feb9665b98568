//! Error types.
//!
//! Configuration problems are fatal and stop the process before the capture
//! loop starts. Capture and persistence problems only drop the current pair.

use std::path::PathBuf;

use thiserror::Error;

use crate::capture::Role;
use crate::input::KeyCode;

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid {role} region: {reason}")]
    InvalidRegion { role: Role, reason: String },
    #[error("poll interval must be a positive number of seconds, got {0}")]
    InvalidPollInterval(f64),
    #[error("unknown key identifier \"{0}\"")]
    UnknownKey(String),
    #[error("trigger key and stop key are both {0}")]
    KeyConflict(KeyCode),
    #[error("unknown log level \"{0}\"")]
    UnknownLogLevel(String),
    #[error("output root {} is not writable: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not determine screen size: {0}")]
    ScreenSize(#[from] CaptureError),
    #[error("screen capture is only supported on Windows")]
    UnsupportedPlatform,
}

/// A single screen acquisition failed. Recoverable.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen acquisition failed: {0}")]
    Acquisition(String),
    #[error("{role} region does not fit in the captured {width}x{height} frame")]
    RegionOutsideFrame { role: Role, width: u32, height: u32 },
}

/// Writing one half of a frame pair failed. Recoverable.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to stage {role} frame in {}: {source}", dir.display())]
    Stage {
        role: Role,
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {role} frame: {source}")]
    Encode {
        role: Role,
        source: image::ImageError,
    },
    #[error("failed to publish {}: {source}", path.display())]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("frame index {0} already exists in this session")]
    IndexExists(u32),
}

/// Why a trigger produced no pair.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
