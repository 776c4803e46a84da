//! Mediacrunch Core
//!
//! GUI-free facade over the crunch engine for headless consumers (CLI,
//! integration tests). Re-exports the library surface and adds an event
//! broadcasting abstraction so multiple observers can follow one job.

pub use mediacrunch_lib::core::crunch::{
    is_supported_extension, output_path_for, run_crunch, ActiveJob, CrunchEvent, CrunchSpec,
    ANALYZE_FAILED_MESSAGE, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use mediacrunch_lib::core::ffmpeg::{
    detect_ffmpeg_in_dir, detect_system_ffmpeg, validate_ffmpeg, FFmpegError, FFmpegInfo,
    FFmpegProgress, FFmpegResult, FFmpegRunner, FFmpegState, MediaProbe, TranscodeBackend,
    VideoEncodeParams,
};
pub use mediacrunch_lib::core::planner::{
    video_bitrate_kbps, MediaKind, DEFAULT_TARGET_SIZE_BYTES, DEFAULT_TARGET_SIZE_MIB,
};
pub use mediacrunch_lib::core::settings::{AppSettings, EncodeSettings, EngineSettings};
pub use mediacrunch_lib::core::{CoreError, CoreResult, JobId, TimeSec};

pub mod events;
