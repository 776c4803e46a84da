//! FFmpeg shared state
//!
//! Holds the reusable FFmpeg runner state shared across the app. Kept
//! independent of IPC/Tauri command entry points so core logic compiles in
//! unit tests and headless builds without the webview stack.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{detect_ffmpeg_in_dir, detect_system_ffmpeg, FFmpegError, FFmpegInfo, FFmpegRunner};

/// Global FFmpeg runner state.
///
/// Initialized once on startup and reused for all operations.
pub struct FFmpegState {
    runner: Option<FFmpegRunner>,
    info: Option<FFmpegInfo>,
}

impl FFmpegState {
    pub fn new() -> Self {
        Self {
            runner: None,
            info: None,
        }
    }

    /// Installs an already-detected FFmpeg installation (e.g. bundled
    /// sidecar binaries resolved by the GUI shell).
    pub fn install(&mut self, info: FFmpegInfo) {
        self.info = Some(info.clone());
        self.runner = Some(FFmpegRunner::new(info));
    }

    /// Initialize from an optional settings override directory, falling
    /// back to system FFmpeg.
    pub fn initialize(&mut self, override_dir: Option<&Path>) -> Result<(), FFmpegError> {
        if let Some(dir) = override_dir {
            if let Ok(info) = detect_ffmpeg_in_dir(dir) {
                self.install(info);
                return Ok(());
            }
        }

        let info = detect_system_ffmpeg()?;
        self.install(info);
        Ok(())
    }

    /// Get the FFmpeg runner.
    pub fn runner(&self) -> Option<&FFmpegRunner> {
        self.runner.as_ref()
    }

    /// Get FFmpeg info.
    pub fn info(&self) -> Option<&FFmpegInfo> {
        self.info.as_ref()
    }

    /// Check if FFmpeg is available.
    pub fn is_available(&self) -> bool {
        self.runner.is_some()
    }
}

impl Default for FFmpegState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared FFmpeg state for the async runtime.
pub type SharedFFmpegState = Arc<RwLock<FFmpegState>>;

/// Create a new shared FFmpeg state.
pub fn create_ffmpeg_state() -> SharedFFmpegState {
    Arc::new(RwLock::new(FFmpegState::new()))
}
