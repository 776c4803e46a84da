//! Mediacrunch Core Library
//!
//! Crunches a single video or image under a fixed size budget (default
//! 3.8 MiB) for sharing under platform upload limits. This library holds
//! the planner, the job pipeline, and the FFmpeg engine boundary; the
//! Tauri shell is compiled in only with the `gui` feature.
//!
//! ## TypeScript Bindings
//!
//! All IPC types are exported to TypeScript via tauri-specta; run the
//! `export_bindings` binary to regenerate `src/bindings.ts`.

pub mod core;
pub mod ipc;

// NOTE: Unit tests intentionally avoid linking the Tauri runtime. Core
// logic is tested without Tauri; the app entrypoint and command surface
// are compiled only for non-test GUI builds.
#[cfg(all(feature = "gui", not(test)))]
use tokio::sync::Mutex;

#[cfg(all(feature = "gui", not(test)))]
use crate::core::{crunch::ActiveJob, settings::AppSettings};

// =============================================================================
// Application State
// =============================================================================

/// Application state shared across all commands
#[cfg(all(feature = "gui", not(test)))]
pub struct AppState {
    /// Current settings (persisted to the app data dir)
    pub settings: Mutex<AppSettings>,
    /// The in-flight crunch job, if any. One job at a time.
    pub active_job: ActiveJob,
}

#[cfg(all(feature = "gui", not(test)))]
impl AppState {
    /// Creates app state from loaded settings
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
            active_job: ActiveJob::new(),
        }
    }
}

// =============================================================================
// Tauri Application Entry Point
// =============================================================================
#[cfg(all(feature = "gui", not(test)))]
mod tauri_app {
    use super::*;
    use std::path::PathBuf;
    use std::sync::OnceLock;

    use tauri::Manager;

    use crate::core::ffmpeg::{create_ffmpeg_state, detect_bundled_ffmpeg};

    static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

    fn init_logging(app: &tauri::AppHandle) {
        // Log to a daily-rolling file in the platform app log dir (best
        // effort); stdout remains available in dev.
        let log_dir = app
            .path()
            .app_log_dir()
            .unwrap_or_else(|_| PathBuf::from(".logs"));

        let _ = std::fs::create_dir_all(&log_dir);

        let file_appender = tracing_appender::rolling::daily(&log_dir, "mediacrunch.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        use tracing_subscriber::prelude::*;

        let env_filter = tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into());

        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(cfg!(debug_assertions));

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer);

        // Avoid panics if already initialized (tests, plugin reloads).
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Collects all commands for tauri-specta type export.
    /// This is used by the bindings generator.
    #[macro_export]
    macro_rules! collect_commands {
        () => {
            tauri_specta::collect_commands![
                $crate::ipc::select_media_file,
                $crate::ipc::start_crunch,
                $crate::ipc::check_ffmpeg,
                $crate::ipc::get_settings,
                $crate::ipc::update_settings,
                $crate::ipc::quit_app,
            ]
        };
    }

    /// Initialize and run the Tauri application
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        let ffmpeg_state = create_ffmpeg_state();

        tauri::Builder::default()
            .manage(ffmpeg_state.clone())
            .plugin(tauri_plugin_dialog::init())
            .setup(move |app| {
                init_logging(app.handle());

                tracing::info!("Mediacrunch starting...");

                // Load settings and expose app state to commands.
                let settings_dir = app
                    .path()
                    .app_data_dir()
                    .unwrap_or_else(|_| PathBuf::from("."));
                let settings = AppSettings::load(&settings_dir);
                app.manage(AppState::new(settings.clone()));

                // Initialize FFmpeg: bundled sidecar binaries first, then
                // the settings override directory, then system PATH.
                let ffmpeg = ffmpeg_state.clone();
                let handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    let mut state = ffmpeg.write().await;

                    if let Ok(info) = detect_bundled_ffmpeg(&handle) {
                        state.install(info);
                    } else {
                        let override_dir = settings.engine.ffmpeg_dir.as_ref().map(PathBuf::from);
                        if let Err(e) = state.initialize(override_dir.as_deref()) {
                            tracing::warn!(
                                "FFmpeg not available: {}. Crunching will be disabled.",
                                e
                            );
                            return;
                        }
                    }

                    if let Some(info) = state.info() {
                        tracing::info!(
                            "FFmpeg initialized: version {} (bundled: {})",
                            info.version,
                            info.is_bundled
                        );
                    }
                });

                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                ipc::select_media_file,
                ipc::start_crunch,
                ipc::check_ffmpeg,
                ipc::get_settings,
                ipc::update_settings,
                ipc::quit_app,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}

#[cfg(all(feature = "gui", not(test)))]
pub use tauri_app::run;
