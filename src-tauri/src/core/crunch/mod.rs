//! Crunch Job Module
//!
//! Models a single size-budgeted conversion request and the typed event
//! stream it produces while running.

mod pipeline;

pub use pipeline::run_crunch;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::settings::EncodeSettings;
use crate::core::{new_job_id, CoreError, CoreResult, JobId};

/// Video extensions accepted by the file picker and the CLI.
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

/// Image extensions accepted by the file picker and the CLI.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "png", "gif"];

/// Fixed message shown when the input container cannot be analyzed.
pub const ANALYZE_FAILED_MESSAGE: &str = "Could not analyze file.";

/// Whether a file extension is on the accepted media allow-list.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str()) || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Derives the output path for an input file: same directory, name
/// `crunched_<unix_ms>`, original extension. Never collides with the
/// input path, even for an input that is itself a `crunched_` file.
pub fn output_path_for(input: &Path, unix_ms: i64) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut stamp = unix_ms;
    loop {
        let candidate = dir.join(format!("crunched_{}{}", stamp, ext));
        if candidate.as_path() != input {
            return candidate;
        }
        stamp += 1;
    }
}

/// A single conversion request. Immutable once the engine invocation
/// begins; dropped after the terminal event is relayed.
#[derive(Debug, Clone)]
pub struct CrunchSpec {
    /// Job ID (ULID)
    pub id: JobId,
    /// Source media file
    pub input_path: PathBuf,
    /// Derived destination file
    pub output_path: PathBuf,
    /// Output size budget in bytes
    pub target_size_bytes: u64,
    /// Output frame height for the video pipeline
    pub output_height: u32,
    /// Encoder preset for the video pipeline
    pub preset: String,
    /// Fixed quality parameter for the image pipeline
    pub image_quality: u8,
}

impl CrunchSpec {
    /// Builds a job spec for an input file using the current encode
    /// settings. Rejects unsupported or missing extensions.
    pub fn new(input: &Path, settings: &EncodeSettings) -> CoreResult<Self> {
        let ext = input
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .ok_or(CoreError::MissingExtension)?;

        if !is_supported_extension(&ext) {
            return Err(CoreError::UnsupportedExtension(ext));
        }

        let output_path = output_path_for(input, chrono::Utc::now().timestamp_millis());

        Ok(Self {
            id: new_job_id(),
            input_path: input.to_path_buf(),
            output_path,
            target_size_bytes: settings.target_size_bytes(),
            output_height: settings.output_height,
            preset: settings.preset.clone(),
            image_quality: settings.image_quality,
        })
    }
}

/// Tracks the single in-flight job.
///
/// A second submission while one is running is rejected rather than
/// queued; the engine invocation is the serialization point.
#[derive(Clone, Default)]
pub struct ActiveJob {
    inner: Arc<Mutex<Option<JobId>>>,
}

impl ActiveJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the job slot, failing if another job is still running.
    pub fn try_begin(&self, id: &JobId) -> CoreResult<()> {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Err(CoreError::JobAlreadyRunning);
        }
        *slot = Some(id.clone());
        Ok(())
    }

    /// Releases the slot after a job's terminal event has been relayed.
    /// A stale ID (from an already-replaced job) is ignored.
    pub fn finish(&self, id: &JobId) {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_deref() == Some(id.as_str()) {
            *slot = None;
        }
    }

    /// Returns the ID of the running job, if any.
    pub fn current(&self) -> Option<JobId> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Typed event stream produced by a running crunch job.
///
/// Zero or more `Progress` events followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum CrunchEvent {
    /// Fractional completion reported by the engine, relayed verbatim
    Progress { percent: f32 },
    /// Job finished; the output file is at `output_path`
    Completed { output_path: PathBuf },
    /// Job failed; human-readable reason
    Failed { message: String },
}

impl CrunchEvent {
    /// Whether this event ends the job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CrunchEvent::Completed { .. } | CrunchEvent::Failed { .. }
        )
    }
}
