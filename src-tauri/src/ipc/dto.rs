//! IPC Data Transfer Objects
//!
//! Payloads returned by commands to the frontend. All types are exported
//! to TypeScript via tauri-specta.

use std::path::Path;

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::{CoreError, CoreResult, JobId};

/// A file chosen in the picker dialog.
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFile {
    /// Absolute path
    pub path: String,
    /// Base file name
    pub name: String,
    /// File size in MiB, rounded to 2 decimals
    pub size_mib: f64,
}

impl SelectedFile {
    /// Builds the DTO from a picked path, reading its size from disk.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| CoreError::FileNotFound(path.display().to_string()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            path: path.display().to_string(),
            name,
            size_mib: round_mib(metadata.len()),
        })
    }
}

/// Bytes to MiB, rounded to 2 decimals.
fn round_mib(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Acknowledgement returned when a crunch job is accepted.
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct StartedCrunch {
    /// Job ID to correlate subsequent events
    pub job_id: JobId,
    /// Derived destination file
    pub output_path: String,
}

/// FFmpeg availability and version information.
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct FFmpegStatus {
    /// Whether FFmpeg is available
    pub available: bool,
    /// FFmpeg version string (if available)
    pub version: Option<String>,
    /// Whether using bundled FFmpeg (vs system)
    pub is_bundled: bool,
    /// Path to ffmpeg executable
    pub ffmpeg_path: Option<String>,
    /// Path to ffprobe executable
    pub ffprobe_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_mib_two_decimals() {
        assert_eq!(round_mib(0), 0.0);
        assert_eq!(round_mib(1024 * 1024), 1.0);
        // 3.8 MiB budget
        assert_eq!(round_mib(3_984_588), 3.8);
        // 1.005 MiB rounds half-up
        assert_eq!(round_mib(1_053_819), 1.01);
    }

    #[test]
    fn test_selected_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();

        let selected = SelectedFile::from_path(&path).unwrap();
        assert_eq!(selected.name, "clip.mp4");
        assert_eq!(selected.size_mib, 2.0);
        assert!(selected.path.ends_with("clip.mp4"));
    }

    #[test]
    fn test_selected_file_missing_path() {
        let err = SelectedFile::from_path(Path::new("/no/such/file.mp4")).unwrap_err();
        assert!(matches!(err, CoreError::FileNotFound(_)));
    }

    #[test]
    fn test_dto_serialization_is_camel_case() {
        let started = StartedCrunch {
            job_id: "01J000000000000000000000AB".to_string(),
            output_path: "/tmp/crunched_1.mp4".to_string(),
        };

        let json = serde_json::to_string(&started).unwrap();
        assert!(json.contains("jobId"));
        assert!(json.contains("outputPath"));
    }
}
