//! Settings Persistence System
//!
//! Provides persistent application settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//!
//! Storage location: {app_data_dir}/settings.json

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::warn;

use crate::core::planner::DEFAULT_TARGET_SIZE_MIB;
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// x264 presets accepted for the encode preset setting.
const X264_PRESETS: [&str; 9] = [
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Encode settings
    #[serde(default)]
    pub encode: EncodeSettings,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            encode: EncodeSettings::default(),
            engine: EngineSettings::default(),
        }
    }
}

/// Encode settings for both pipelines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct EncodeSettings {
    /// Output size budget in MiB
    #[serde(default = "default_target_size_mib")]
    pub target_size_mib: f64,

    /// Output frame height for the video pipeline
    #[serde(default = "default_output_height")]
    pub output_height: u32,

    /// x264 encoder preset (speed/ratio tradeoff)
    #[serde(default = "default_preset")]
    pub preset: String,

    /// `-q:v` quality for the image pipeline (2 best - 31 worst)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,
}

fn default_target_size_mib() -> f64 {
    DEFAULT_TARGET_SIZE_MIB
}

fn default_output_height() -> u32 {
    720
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_image_quality() -> u8 {
    5
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            target_size_mib: default_target_size_mib(),
            output_height: default_output_height(),
            preset: default_preset(),
            image_quality: default_image_quality(),
        }
    }
}

impl EncodeSettings {
    /// Size budget converted to whole bytes.
    pub fn target_size_bytes(&self) -> u64 {
        (self.target_size_mib * 1024.0 * 1024.0) as u64
    }
}

/// Engine (FFmpeg) settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Directory containing ffmpeg/ffprobe binaries; overrides detection
    #[serde(default)]
    pub ffmpeg_dir: Option<String>,
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Intentionally tolerant: corrects bad values instead of failing, so
    /// corrupted/old configs don't brick the app.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        if !self.encode.target_size_mib.is_finite() {
            self.encode.target_size_mib = default_target_size_mib();
        }
        self.encode.target_size_mib = self.encode.target_size_mib.clamp(1.0, 100.0);

        self.encode.output_height = self.encode.output_height.clamp(240, 2160);
        // 4:2:0 output requires even dimensions
        self.encode.output_height &= !1;

        if !X264_PRESETS.contains(&self.encode.preset.as_str()) {
            self.encode.preset = default_preset();
        }

        self.encode.image_quality = self.encode.image_quality.clamp(2, 31);

        if let Some(dir) = &self.engine.ffmpeg_dir {
            if dir.trim().is_empty() {
                self.engine.ffmpeg_dir = None;
            }
        }
    }

    /// Loads settings from `{dir}/settings.json`.
    ///
    /// Missing or unreadable files yield defaults; values are normalized
    /// before being returned.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(SETTINGS_FILE);

        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(
                        "Settings file {} is invalid ({}); using defaults",
                        path.display(),
                        e
                    );
                    AppSettings::default()
                }
            },
            Err(_) => AppSettings::default(),
        };

        settings.normalize();
        settings
    }

    /// Saves settings to `{dir}/settings.json` atomically (temp file +
    /// rename). The stored value is normalized first.
    pub fn save(&self, dir: &Path) -> CoreResult<()> {
        let mut normalized = self.clone();
        normalized.normalize();

        fs::create_dir_all(dir)?;

        let path = dir.join(SETTINGS_FILE);
        let tmp_path = tmp_path_for(&path);

        let json = serde_json::to_string_pretty(&normalized)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CoreError::IoError(e)
        })?;

        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.encode.target_size_mib, 3.8);
        assert_eq!(settings.encode.output_height, 720);
        assert_eq!(settings.encode.preset, "fast");
        assert_eq!(settings.encode.image_quality, 5);
        assert!(settings.engine.ffmpeg_dir.is_none());
    }

    #[test]
    fn test_target_size_bytes() {
        let encode = EncodeSettings::default();
        assert_eq!(encode.target_size_bytes(), 3_984_588);
    }

    #[test]
    fn test_normalize_clamps_out_of_range_values() {
        let mut settings = AppSettings {
            encode: EncodeSettings {
                target_size_mib: 0.0,
                output_height: 721,
                preset: "warp-speed".to_string(),
                image_quality: 99,
            },
            ..Default::default()
        };

        settings.normalize();

        assert_eq!(settings.encode.target_size_mib, 1.0);
        assert_eq!(settings.encode.output_height, 720);
        assert_eq!(settings.encode.preset, "fast");
        assert_eq!(settings.encode.image_quality, 31);
    }

    #[test]
    fn test_normalize_rejects_non_finite_budget() {
        let mut settings = AppSettings::default();
        settings.encode.target_size_mib = f64::NAN;
        settings.normalize();
        assert_eq!(settings.encode.target_size_mib, 3.8);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();

        let mut settings = AppSettings::default();
        settings.encode.target_size_mib = 7.5;
        settings.encode.preset = "medium".to_string();
        settings.save(dir.path()).unwrap();

        let loaded = AppSettings::load(dir.path());
        assert_eq!(loaded.encode.target_size_mib, 7.5);
        assert_eq!(loaded.encode.preset, "medium");
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = AppSettings::load(dir.path());
        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn test_load_corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{not valid json").unwrap();

        let loaded = AppSettings::load(dir.path());
        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"encode": {"targetSizeMib": 2.0}}"#,
        )
        .unwrap();

        let loaded = AppSettings::load(dir.path());
        assert_eq!(loaded.encode.target_size_mib, 2.0);
        assert_eq!(loaded.encode.output_height, 720);
        assert_eq!(loaded.encode.preset, "fast");
    }
}
