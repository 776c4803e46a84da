//! Mediacrunch Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::ffmpeg::FFmpegError;
use super::TimeSec;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Input has no file extension")]
    MissingExtension,

    // =========================================================================
    // Planner Errors
    // =========================================================================
    #[error("Invalid media duration: {0} seconds")]
    InvalidDuration(TimeSec),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("A crunch job is already running")]
    JobAlreadyRunning,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Engine error: {0}")]
    Engine(#[from] FFmpegError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-friendly error message for IPC
    pub fn to_ipc_error(&self) -> String {
        self.to_string()
    }
}
