//! Crunch Pipeline
//!
//! Drives one job through `Probing -> {ImageEncode | VideoEncode} ->
//! {Completed | Failed}` against a `TranscodeBackend`, relaying engine
//! progress as it arrives. No retry; the first terminal event ends the
//! job.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::ffmpeg::{FFmpegError, FFmpegProgress, TranscodeBackend, VideoEncodeParams};
use crate::core::planner::{video_bitrate_kbps, MediaKind};
use crate::core::{CoreError, CoreResult};

use super::{CrunchEvent, CrunchSpec, ANALYZE_FAILED_MESSAGE};

/// Runs a crunch job to completion, emitting zero or more `Progress`
/// events followed by exactly one terminal event on `events`.
pub async fn run_crunch<B: TranscodeBackend>(
    backend: &B,
    spec: &CrunchSpec,
    events: mpsc::Sender<CrunchEvent>,
) {
    let terminal = match drive(backend, spec, &events).await {
        Ok(()) => {
            info!(job_id = %spec.id, output = %spec.output_path.display(), "crunch completed");
            CrunchEvent::Completed {
                output_path: spec.output_path.clone(),
            }
        }
        Err(err) => {
            warn!(job_id = %spec.id, error = %err, "crunch failed");
            remove_partial_output(spec);
            CrunchEvent::Failed {
                message: failure_message(&err),
            }
        }
    };

    let _ = events.send(terminal).await;
}

async fn drive<B: TranscodeBackend>(
    backend: &B,
    spec: &CrunchSpec,
    events: &mpsc::Sender<CrunchEvent>,
) -> CoreResult<()> {
    let probe = backend.probe(&spec.input_path).await?;

    match MediaKind::from_probe(&probe) {
        MediaKind::Image => {
            info!(job_id = %spec.id, "encoding still image at q:v {}", spec.image_quality);
            backend
                .crunch_image(&spec.input_path, &spec.output_path, spec.image_quality)
                .await?;
        }
        MediaKind::Video => {
            let bitrate_kbps = video_bitrate_kbps(probe.duration_sec, spec.target_size_bytes)?;
            let params = VideoEncodeParams::new(bitrate_kbps, probe.duration_sec)
                .with_output_height(spec.output_height)
                .with_preset(&spec.preset);

            info!(
                job_id = %spec.id,
                duration_sec = probe.duration_sec,
                bitrate_kbps,
                "encoding video under size budget"
            );

            let (progress_tx, mut progress_rx) = mpsc::channel::<FFmpegProgress>(32);
            let progress_events = events.clone();
            let forward = tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    let event = CrunchEvent::Progress {
                        percent: progress.percent,
                    };
                    if progress_events.send(event).await.is_err() {
                        break;
                    }
                }
            });

            let result = backend
                .crunch_video(
                    &spec.input_path,
                    &spec.output_path,
                    &params,
                    Some(progress_tx),
                )
                .await;

            // All progress senders are gone once the encode returns, so the
            // forwarder drains and exits before the terminal event is sent.
            let _ = forward.await;

            result?;
        }
    }

    Ok(())
}

/// Maps a pipeline error onto the message relayed to the presentation
/// layer: a fixed string for unreadable inputs, the engine's raw stderr
/// for mid-transcode failures.
fn failure_message(err: &CoreError) -> String {
    match err {
        CoreError::Engine(FFmpegError::ProbeError(_))
        | CoreError::Engine(FFmpegError::InvalidInput(_)) => ANALYZE_FAILED_MESSAGE.to_string(),
        CoreError::Engine(FFmpegError::ExecutionFailed(text)) => text.clone(),
        other => other.to_string(),
    }
}

/// Removes a partial output file left behind by a failed encode.
fn remove_partial_output(spec: &CrunchSpec) {
    if spec.output_path.exists() {
        if let Err(e) = std::fs::remove_file(&spec.output_path) {
            warn!(
                output = %spec.output_path.display(),
                error = %e,
                "failed to remove partial output"
            );
        }
    }
}
