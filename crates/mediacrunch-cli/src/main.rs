//! Mediacrunch CLI
//!
//! Headless front end for the crunch engine: same planner, same pipeline,
//! progress printed to the terminal instead of relayed to a webview.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing_subscriber::EnvFilter;

use mediacrunch_core::events::EventBus;
use mediacrunch_core::{
    run_crunch, AppSettings, CrunchEvent, CrunchSpec, FFmpegRunner, FFmpegState, TranscodeBackend,
};

#[derive(Parser, Debug)]
#[command(
    name = "mediacrunch-cli",
    version,
    about = "Crunch a video or image under a fixed size budget"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode a media file to fit under the size budget
    Crunch {
        /// Input media file (mp4/mov/avi/jpg/png/gif)
        input: PathBuf,

        /// Output size budget in MiB
        #[arg(long)]
        target_size_mib: Option<f64>,

        /// Output frame height for videos
        #[arg(long)]
        height: Option<u32>,

        /// x264 encoder preset
        #[arg(long)]
        preset: Option<String>,

        /// `-q:v` quality for images (2 best - 31 worst)
        #[arg(long)]
        image_quality: Option<u8>,

        /// Directory containing ffmpeg/ffprobe (overrides detection)
        #[arg(long)]
        ffmpeg_dir: Option<PathBuf>,
    },
    /// Print container/stream metadata for a media file as JSON
    Probe {
        /// Input media file
        input: PathBuf,

        /// Directory containing ffmpeg/ffprobe (overrides detection)
        #[arg(long)]
        ffmpeg_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Crunch {
            input,
            target_size_mib,
            height,
            preset,
            image_quality,
            ffmpeg_dir,
        } => {
            crunch(
                input,
                target_size_mib,
                height,
                preset,
                image_quality,
                ffmpeg_dir,
            )
            .await
        }
        Command::Probe { input, ffmpeg_dir } => probe(input, ffmpeg_dir).await,
    }
}

fn detect_runner(ffmpeg_dir: Option<PathBuf>) -> anyhow::Result<FFmpegRunner> {
    let mut state = FFmpegState::new();
    state
        .initialize(ffmpeg_dir.as_deref())
        .context("FFmpeg not found")?;

    state
        .runner()
        .cloned()
        .context("FFmpeg runner not initialized")
}

async fn crunch(
    input: PathBuf,
    target_size_mib: Option<f64>,
    height: Option<u32>,
    preset: Option<String>,
    image_quality: Option<u8>,
    ffmpeg_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let runner = detect_runner(ffmpeg_dir)?;
    tracing::info!("using FFmpeg {}", runner.info().version);

    if !input.exists() {
        bail!("input file not found: {}", input.display());
    }

    let mut settings = AppSettings::default();
    if let Some(v) = target_size_mib {
        settings.encode.target_size_mib = v;
    }
    if let Some(v) = height {
        settings.encode.output_height = v;
    }
    if let Some(v) = preset {
        settings.encode.preset = v;
    }
    if let Some(v) = image_quality {
        settings.encode.image_quality = v;
    }
    settings.normalize();

    let spec = CrunchSpec::new(&input, &settings.encode)?;

    println!(
        "crunching {} -> {}",
        spec.input_path.display(),
        spec.output_path.display()
    );

    let bus = EventBus::default();
    let mut events = bus.subscribe();

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn({
        let bus = bus.clone();
        async move { bus.forward(rx).await }
    });

    let job_spec = spec.clone();
    tokio::spawn(async move {
        run_crunch(&runner, &job_spec, tx).await;
    });

    loop {
        match events.recv().await {
            Ok(CrunchEvent::Progress { percent }) => {
                print!("\r{percent:5.1}%");
                let _ = std::io::stdout().flush();
            }
            Ok(CrunchEvent::Completed { output_path }) => {
                println!("\rdone: {}", output_path.display());
                return Ok(());
            }
            Ok(CrunchEvent::Failed { message }) => {
                println!();
                bail!(message);
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => bail!("job ended without a terminal event"),
        }
    }
}

async fn probe(input: PathBuf, ffmpeg_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let runner = detect_runner(ffmpeg_dir)?;

    let probe = runner.probe(&input).await?;
    println!("{}", serde_json::to_string_pretty(&probe)?);

    Ok(())
}
