//! Bitrate Planner
//!
//! Computes the target video bitrate for a size-budgeted encode and
//! classifies probed assets into the image or video pipeline.

use serde::{Deserialize, Serialize};
use specta::Type;

use super::ffmpeg::MediaProbe;
use super::{CoreError, CoreResult, TimeSec};

/// Default output size budget in MiB.
pub const DEFAULT_TARGET_SIZE_MIB: f64 = 3.8;

/// Default output size budget in bytes.
pub const DEFAULT_TARGET_SIZE_BYTES: u64 = (DEFAULT_TARGET_SIZE_MIB * 1024.0 * 1024.0) as u64;

/// Fraction of the raw bitrate actually allocated to the encoder.
///
/// The 5% margin absorbs container/multiplexing overhead and encoder
/// variance so the output stays under the hard size limit. Audio is
/// stripped entirely, so the whole budget goes to the video stream.
const SAFETY_MARGIN: f64 = 0.95;

/// Computes the target video bitrate in kbps for a given duration and
/// size budget.
///
/// `floor(target_bytes * 8 / duration / 1000) * 0.95`
///
/// Zero, negative, and non-finite durations are rejected rather than
/// letting a division artifact (NaN/Infinity) reach the encoder.
pub fn video_bitrate_kbps(duration_sec: TimeSec, target_size_bytes: u64) -> CoreResult<f64> {
    if !duration_sec.is_finite() || duration_sec <= 0.0 {
        return Err(CoreError::InvalidDuration(duration_sec));
    }

    let target_bits = target_size_bytes as f64 * 8.0;
    let raw_kbps = (target_bits / duration_sec / 1000.0).floor();

    Ok(raw_kbps * SAFETY_MARGIN)
}

/// How an asset is processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    /// Still image: fixed-quality re-encode, no size guarantee
    Image,
    /// Video: size-budgeted re-encode
    Video,
}

impl MediaKind {
    /// Classifies a probed asset: a still image iff no stream reports a
    /// video media type. Exhaustive two-way branch.
    pub fn from_probe(probe: &MediaProbe) -> Self {
        if probe.has_video() {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ffmpeg::{AudioStreamInfo, VideoStreamInfo};

    fn probe_with_streams(video: bool, audio: bool) -> MediaProbe {
        MediaProbe {
            duration_sec: 12.0,
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            size_bytes: 9_000_000,
            video: video.then(|| VideoStreamInfo {
                width: 1920,
                height: 1080,
                fps: 30.0,
                codec: "h264".to_string(),
            }),
            audio: audio.then(|| AudioStreamInfo {
                codec: "aac".to_string(),
                sample_rate: 48000,
                channels: 2,
            }),
        }
    }

    #[test]
    fn test_bitrate_formula_60s() {
        // floor(3.8 MiB * 8 / 60 / 1000) * 0.95 = 531 * 0.95
        let kbps = video_bitrate_kbps(60.0, DEFAULT_TARGET_SIZE_BYTES).unwrap();
        assert!((kbps - 504.45).abs() < 0.01);
    }

    #[test]
    fn test_bitrate_formula_10s() {
        let expected = (DEFAULT_TARGET_SIZE_BYTES as f64 * 8.0 / 10.0 / 1000.0).floor() * 0.95;
        let kbps = video_bitrate_kbps(10.0, DEFAULT_TARGET_SIZE_BYTES).unwrap();
        assert_eq!(kbps, expected);
        assert!((kbps - 3027.65).abs() < 1.0);
    }

    #[test]
    fn test_bitrate_is_strictly_positive_for_long_inputs() {
        // Even a multi-hour input must plan a positive (if tiny) bitrate.
        let kbps = video_bitrate_kbps(4.0 * 3600.0, DEFAULT_TARGET_SIZE_BYTES).unwrap();
        assert!(kbps > 0.0);
        assert!(kbps.is_finite());
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let err = video_bitrate_kbps(0.0, DEFAULT_TARGET_SIZE_BYTES).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDuration(_)));
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let err = video_bitrate_kbps(-3.0, DEFAULT_TARGET_SIZE_BYTES).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDuration(_)));
    }

    #[test]
    fn test_non_finite_duration_is_rejected() {
        assert!(video_bitrate_kbps(f64::NAN, DEFAULT_TARGET_SIZE_BYTES).is_err());
        assert!(video_bitrate_kbps(f64::INFINITY, DEFAULT_TARGET_SIZE_BYTES).is_err());
    }

    #[test]
    fn test_classification_video_stream_routes_to_video() {
        assert_eq!(
            MediaKind::from_probe(&probe_with_streams(true, true)),
            MediaKind::Video
        );
        assert_eq!(
            MediaKind::from_probe(&probe_with_streams(true, false)),
            MediaKind::Video
        );
    }

    #[test]
    fn test_classification_no_video_stream_routes_to_image() {
        assert_eq!(
            MediaKind::from_probe(&probe_with_streams(false, true)),
            MediaKind::Image
        );
        assert_eq!(
            MediaKind::from_probe(&probe_with_streams(false, false)),
            MediaKind::Image
        );
    }

    #[test]
    fn test_default_budget_constant() {
        assert_eq!(DEFAULT_TARGET_SIZE_BYTES, 3_984_588);
    }
}
