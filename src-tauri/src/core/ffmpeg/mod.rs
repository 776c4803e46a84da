//! FFmpeg Integration Module
//!
//! Provides the engine boundary for media crunching:
//! - Probing container/stream metadata via ffprobe
//! - Size-budgeted video re-encoding
//! - Best-effort image re-encoding
//!
//! Supports both bundled FFmpeg binaries (via Tauri sidecar) and
//! system-installed FFmpeg.

mod detection;
mod runner;
mod state;

pub use detection::*;
pub use runner::{
    AudioStreamInfo, FFmpegProgress, FFmpegRunner, MediaProbe, ProgressParser, TranscodeBackend,
    VideoEncodeParams, VideoStreamInfo,
};
pub use state::{create_ffmpeg_state, FFmpegState, SharedFFmpegState};

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Please install FFmpeg or ensure bundled binaries are present.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output path error: {0}")]
    OutputError(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_error_display() {
        let err = FFmpegError::NotFound;
        assert!(err.to_string().contains("FFmpeg not found"));

        let err = FFmpegError::ExecutionFailed("exit code 1".to_string());
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn test_probe_error_keeps_engine_text() {
        let err = FFmpegError::ProbeError("Invalid data found when processing input".to_string());
        assert!(err.to_string().contains("Invalid data found"));
    }
}
