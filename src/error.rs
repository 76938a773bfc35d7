// src/error.rs
use thiserror::Error;

/// Failures on the I/O-facing edges. Classification and encounter
/// resolution never fail.
#[derive(Error, Debug)]
pub enum PoseRunnerError {
    #[error("Invalid frame size: {width}x{height}")]
    InvalidFrameSize { width: f64, height: f64 },

    #[error("Confidence threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Invalid scheduler setting: {0}")]
    InvalidSchedule(String),

    #[error("Malformed observation on line {line}: {reason}")]
    MalformedObservation { line: usize, reason: String },

    #[error("Session has no recorded frames")]
    EmptySession,

    #[error("Game session has shut down")]
    SessionClosed,
}
