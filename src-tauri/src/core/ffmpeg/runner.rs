//! FFmpeg Runner Module
//!
//! Executes FFmpeg commands for media crunching: probing, size-budgeted
//! video re-encoding, and best-effort image re-encoding.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use crate::core::process::configure_tokio_command;
use crate::core::TimeSec;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};

/// Progress information for a running encode
#[derive(Debug, Clone)]
pub struct FFmpegProgress {
    /// Current output frame number
    pub frame: u64,
    /// Progress percentage (0.0 - 100.0)
    pub percent: f32,
    /// Current processing speed (fps)
    pub fps: f32,
    /// Current time position in the output
    pub time_sec: TimeSec,
}

/// Media information extracted by FFprobe
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MediaProbe {
    /// Duration in seconds
    pub duration_sec: TimeSec,
    /// Container format
    pub format: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// First video stream (if present)
    pub video: Option<VideoStreamInfo>,
    /// First audio stream (if present)
    pub audio: Option<AudioStreamInfo>,
}

impl MediaProbe {
    /// Whether any stream reported a video media type.
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }
}

/// Video stream information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VideoStreamInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (frames per second)
    pub fps: f64,
    /// Codec name (e.g., "h264", "vp9")
    pub codec: String,
}

/// Audio stream information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioStreamInfo {
    /// Codec name (e.g., "aac", "mp3")
    pub codec: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
}

/// Parameters for a size-budgeted video encode.
///
/// The defaults mirror the one encode profile the app ships: widely
/// compatible H.264, speed-leaning preset, 720-high output with the width
/// snapped down to an even value (required by 4:2:0 chroma subsampling),
/// and the container index moved up front for progressive playback.
#[derive(Debug, Clone)]
pub struct VideoEncodeParams {
    /// Video codec passed to `-c:v`
    pub video_codec: String,
    /// Target video bitrate in kbps
    pub bitrate_kbps: f64,
    /// Encoder preset (speed/ratio tradeoff)
    pub preset: String,
    /// Output frame height; width follows the input aspect ratio
    pub output_height: u32,
    /// Pixel format passed to `-pix_fmt`
    pub pixel_format: String,
    /// Input duration, used for progress percentage estimation
    pub duration_sec: TimeSec,
}

impl VideoEncodeParams {
    /// Creates encode parameters for a planned bitrate and known duration.
    pub fn new(bitrate_kbps: f64, duration_sec: TimeSec) -> Self {
        Self {
            video_codec: "libx264".to_string(),
            bitrate_kbps,
            preset: "fast".to_string(),
            output_height: 720,
            pixel_format: "yuv420p".to_string(),
            duration_sec,
        }
    }

    /// Sets the output height.
    pub fn with_output_height(mut self, height: u32) -> Self {
        self.output_height = height;
        self
    }

    /// Sets the encoder preset.
    pub fn with_preset(mut self, preset: &str) -> Self {
        self.preset = preset.to_string();
        self
    }

    /// Scale filter fixing the output height; the width preserves the
    /// input aspect ratio, rounded down to the nearest even integer.
    pub fn scale_filter(&self) -> String {
        format!("scale=trunc(oh*a/2)*2:{}", self.output_height)
    }

    /// Bitrate argument for `-b:v`, whole kbps.
    pub fn bitrate_arg(&self) -> String {
        format!("{}k", self.bitrate_kbps as u64)
    }
}

/// Incremental parser for FFmpeg's `-progress pipe:1` key=value output.
///
/// Accumulates `frame=`, `fps=` and `out_time_ms=` fields and emits a
/// snapshot each time a `progress=` line closes a block.
#[derive(Debug)]
pub struct ProgressParser {
    duration_sec: TimeSec,
    frame: u64,
    fps: f32,
    time_sec: TimeSec,
}

impl ProgressParser {
    pub fn new(duration_sec: TimeSec) -> Self {
        Self {
            duration_sec,
            frame: 0,
            fps: 0.0,
            time_sec: 0.0,
        }
    }

    /// Feeds one line of progress output; returns a snapshot when a
    /// `progress=` line completes a block.
    pub fn feed(&mut self, line: &str) -> Option<FFmpegProgress> {
        if let Some(value) = line.strip_prefix("frame=") {
            self.frame = value.trim().parse().unwrap_or(0);
        } else if let Some(value) = line.strip_prefix("fps=") {
            self.fps = value.trim().parse().unwrap_or(0.0);
        } else if let Some(value) = line.strip_prefix("out_time_ms=") {
            // out_time_ms is actually microseconds
            let us: u64 = value.trim().parse().unwrap_or(0);
            self.time_sec = us as f64 / 1_000_000.0;
        } else if line.starts_with("progress=") {
            let percent = if self.duration_sec > 0.0 {
                ((self.time_sec / self.duration_sec * 100.0) as f32).min(100.0)
            } else {
                0.0
            };

            return Some(FFmpegProgress {
                frame: self.frame,
                percent,
                fps: self.fps,
                time_sec: self.time_sec,
            });
        }

        None
    }
}

/// Engine capability: probe a media file and transcode it.
///
/// `FFmpegRunner` is the production implementation; tests substitute mocks
/// to exercise the crunch pipeline without spawning processes.
#[async_trait]
pub trait TranscodeBackend: Send + Sync {
    /// Inspect container/stream metadata without decoding.
    async fn probe(&self, input: &Path) -> FFmpegResult<MediaProbe>;

    /// Re-encode a video under the planned bitrate, reporting fractional
    /// completion through `progress_tx` as the engine emits it.
    async fn crunch_video(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoEncodeParams,
        progress_tx: Option<mpsc::Sender<FFmpegProgress>>,
    ) -> FFmpegResult<()>;

    /// Re-encode a still image with a fixed quality parameter. Best
    /// effort: no size target is enforced for stills.
    async fn crunch_image(&self, input: &Path, output: &Path, quality: u8) -> FFmpegResult<()>;
}

/// FFmpeg Runner for executing media crunching commands
#[derive(Clone)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
}

impl FFmpegRunner {
    /// Create a new FFmpegRunner from a detected FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    /// Get the FFmpeg info
    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    fn check_input(input: &Path) -> FFmpegResult<()> {
        if !input.exists() {
            return Err(FFmpegError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }
        Ok(())
    }

    fn ensure_output_dir(output: &Path) -> FFmpegResult<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FFmpegError::OutputError(format!("Failed to create output directory: {}", e))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl TranscodeBackend for FFmpegRunner {
    async fn probe(&self, input: &Path) -> FFmpegResult<MediaProbe> {
        Self::check_input(input)?;

        let mut cmd = tokio::process::Command::new(&self.info.ffprobe_path);
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            &input.to_string_lossy(),
        ]);
        configure_tokio_command(&mut cmd);

        let output = cmd.output().await.map_err(FFmpegError::ProcessError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ProbeError(format!(
                "FFprobe failed: {}",
                stderr
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&json_str)
    }

    async fn crunch_video(
        &self,
        input: &Path,
        output: &Path,
        params: &VideoEncodeParams,
        progress_tx: Option<mpsc::Sender<FFmpegProgress>>,
    ) -> FFmpegResult<()> {
        Self::check_input(input)?;
        Self::ensure_output_dir(output)?;

        let mut cmd = tokio::process::Command::new(&self.info.ffmpeg_path);
        cmd.args([
            "-i",
            &input.to_string_lossy(),
            "-c:v",
            &params.video_codec,
            "-b:v",
            &params.bitrate_arg(),
            "-an",
            "-preset",
            &params.preset,
            "-vf",
            &params.scale_filter(),
            "-pix_fmt",
            &params.pixel_format,
            "-movflags",
            "+faststart",
            "-progress",
            "pipe:1",
            "-y",
            &output.to_string_lossy(),
        ]);
        configure_tokio_command(&mut cmd);

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(FFmpegError::ProcessError)?;

        // Relay progress blocks from stdout as they arrive.
        if let Some(tx) = progress_tx {
            if let Some(stdout) = child.stdout.take() {
                let mut parser = ProgressParser::new(params.duration_sec);

                tokio::spawn(async move {
                    let reader = BufReader::new(stdout);
                    let mut lines = reader.lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        if let Some(progress) = parser.feed(&line) {
                            if tx.send(progress).await.is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        }

        // Drain stderr concurrently so the engine can't block on a full pipe;
        // the text doubles as the error message on failure.
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let status = child.wait().await.map_err(FFmpegError::ProcessError)?;

        let stderr_text = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let message = if stderr_text.trim().is_empty() {
                format!("FFmpeg exited with {}", status)
            } else {
                stderr_text.trim().to_string()
            };
            return Err(FFmpegError::ExecutionFailed(message));
        }

        Ok(())
    }

    async fn crunch_image(&self, input: &Path, output: &Path, quality: u8) -> FFmpegResult<()> {
        Self::check_input(input)?;
        Self::ensure_output_dir(output)?;

        let mut cmd = tokio::process::Command::new(&self.info.ffmpeg_path);
        cmd.args([
            "-i",
            &input.to_string_lossy(),
            "-q:v",
            &quality.to_string(),
            "-y",
            &output.to_string_lossy(),
        ]);
        configure_tokio_command(&mut cmd);

        let result = cmd.output().await.map_err(FFmpegError::ProcessError)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let message = if stderr.trim().is_empty() {
                format!("FFmpeg exited with {}", result.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(FFmpegError::ExecutionFailed(message));
        }

        Ok(())
    }
}

/// Parse FFprobe JSON output
fn parse_probe_output(json_str: &str) -> FFmpegResult<MediaProbe> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse FFprobe output: {}", e)))?;

    let format = json
        .get("format")
        .ok_or_else(|| FFmpegError::ParseError("Missing format info".to_string()))?;

    let duration_sec = format
        .get("duration")
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = format
        .get("size")
        .and_then(|s| s.as_str())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let format_name = format
        .get("format_name")
        .and_then(|f| f.as_str())
        .unwrap_or("unknown")
        .to_string();

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .cloned()
        .unwrap_or_default();

    let mut video_info: Option<VideoStreamInfo> = None;
    let mut audio_info: Option<AudioStreamInfo> = None;

    for stream in streams {
        let codec_type = stream.get("codec_type").and_then(|c| c.as_str());

        match codec_type {
            Some("video") if video_info.is_none() => {
                video_info = Some(parse_video_stream(&stream));
            }
            Some("audio") if audio_info.is_none() => {
                audio_info = Some(parse_audio_stream(&stream));
            }
            _ => {}
        }
    }

    Ok(MediaProbe {
        duration_sec,
        format: format_name,
        size_bytes,
        video: video_info,
        audio: audio_info,
    })
}

fn parse_video_stream(stream: &serde_json::Value) -> VideoStreamInfo {
    let width = stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;

    // Frame rate arrives as a fraction string, e.g. "30/1" or "30000/1001"
    let fps = stream
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .and_then(|s| {
            let parts: Vec<&str> = s.split('/').collect();
            if parts.len() == 2 {
                let num: f64 = parts[0].parse().ok()?;
                let den: f64 = parts[1].parse().ok()?;
                if den > 0.0 {
                    Some(num / den)
                } else {
                    None
                }
            } else {
                s.parse().ok()
            }
        })
        .unwrap_or(30.0);

    let codec = stream
        .get("codec_name")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown")
        .to_string();

    VideoStreamInfo {
        width,
        height,
        fps,
        codec,
    }
}

fn parse_audio_stream(stream: &serde_json::Value) -> AudioStreamInfo {
    let codec = stream
        .get("codec_name")
        .and_then(|c| c.as_str())
        .unwrap_or("unknown")
        .to_string();

    let sample_rate = stream
        .get("sample_rate")
        .and_then(|s| s.as_str())
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(44100);

    let channels = stream.get("channels").and_then(|c| c.as_u64()).unwrap_or(2) as u8;

    AudioStreamInfo {
        codec,
        sample_rate,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_encode_params_defaults() {
        let params = VideoEncodeParams::new(500.0, 60.0);
        assert_eq!(params.video_codec, "libx264");
        assert_eq!(params.preset, "fast");
        assert_eq!(params.output_height, 720);
        assert_eq!(params.pixel_format, "yuv420p");
    }

    #[test]
    fn test_scale_filter_fixes_height_and_snaps_width_even() {
        let params = VideoEncodeParams::new(500.0, 60.0);
        assert_eq!(params.scale_filter(), "scale=trunc(oh*a/2)*2:720");

        let params = params.with_output_height(480);
        assert_eq!(params.scale_filter(), "scale=trunc(oh*a/2)*2:480");
    }

    #[test]
    fn test_bitrate_arg_whole_kbps() {
        let params = VideoEncodeParams::new(504.45, 60.0);
        assert_eq!(params.bitrate_arg(), "504k");
    }

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "duration": "10.5",
                "size": "1048576",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30/1",
                    "pix_fmt": "yuv420p"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac",
                    "sample_rate": "48000",
                    "channels": 2
                }
            ]
        }"#;

        let probe = parse_probe_output(json).unwrap();
        assert_eq!(probe.duration_sec, 10.5);
        assert_eq!(probe.size_bytes, 1048576);
        assert!(probe.has_video());

        let video = probe.video.unwrap();
        assert_eq!(video.width, 1920);
        assert_eq!(video.height, 1080);
        assert_eq!(video.fps, 30.0);
        assert_eq!(video.codec, "h264");

        let audio = probe.audio.unwrap();
        assert_eq!(audio.sample_rate, 48000);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.codec, "aac");
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = r#"{
            "format": {
                "duration": "3.2",
                "size": "51200",
                "format_name": "mp3"
            },
            "streams": [
                {
                    "codec_type": "audio",
                    "codec_name": "mp3",
                    "sample_rate": "44100",
                    "channels": 2
                }
            ]
        }"#;

        let probe = parse_probe_output(json).unwrap();
        assert!(!probe.has_video());
        assert!(probe.audio.is_some());
    }

    #[test]
    fn test_parse_fractional_framerate() {
        let json = r#"{
            "format": {
                "duration": "1.0",
                "size": "1000",
                "format_name": "mp4"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30000/1001",
                    "pix_fmt": "yuv420p"
                }
            ]
        }"#;

        let probe = parse_probe_output(json).unwrap();
        let video = probe.video.unwrap();
        // 30000/1001 ≈ 29.97
        assert!((video.fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_progress_parser_emits_on_block_end() {
        let mut parser = ProgressParser::new(10.0);

        assert!(parser.feed("frame=120").is_none());
        assert!(parser.feed("fps=60.0").is_none());
        assert!(parser.feed("out_time_ms=5000000").is_none());

        let progress = parser.feed("progress=continue").unwrap();
        assert_eq!(progress.frame, 120);
        assert_eq!(progress.fps, 60.0);
        assert_eq!(progress.time_sec, 5.0);
        assert!((progress.percent - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_progress_parser_clamps_to_100() {
        let mut parser = ProgressParser::new(1.0);
        parser.feed("out_time_ms=2000000");

        let progress = parser.feed("progress=end").unwrap();
        assert_eq!(progress.percent, 100.0);
    }

    #[test]
    fn test_progress_parser_unknown_duration() {
        let mut parser = ProgressParser::new(0.0);
        parser.feed("out_time_ms=1000000");

        let progress = parser.feed("progress=continue").unwrap();
        assert_eq!(progress.percent, 0.0);
    }
}
