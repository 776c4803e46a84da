//! Crunch IPC Commands
//!
//! Tauri commands exposed to the frontend. All types are exported to
//! TypeScript via tauri-specta.

use std::path::PathBuf;

use tauri::{AppHandle, Manager, State};
use tauri_plugin_dialog::DialogExt;
use tokio::sync::mpsc;

use crate::core::crunch::{run_crunch, CrunchSpec, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::core::ffmpeg::SharedFFmpegState;
use crate::core::settings::AppSettings;
use crate::core::CoreError;
use crate::ipc::{EventEmitter, FFmpegStatus, SelectedFile, StartedCrunch};
use crate::AppState;

/// Opens the system file picker constrained to supported media
/// extensions. Returns `None` if the user cancels.
#[tauri::command]
#[specta::specta]
pub fn select_media_file(app: AppHandle) -> Result<Option<SelectedFile>, String> {
    let extensions: Vec<&str> = VIDEO_EXTENSIONS
        .iter()
        .chain(IMAGE_EXTENSIONS.iter())
        .copied()
        .collect();

    let picked = app
        .dialog()
        .file()
        .add_filter("Media", &extensions)
        .blocking_pick_file();

    let Some(picked) = picked else {
        return Ok(None);
    };

    let path = picked.into_path().map_err(|e| e.to_string())?;

    SelectedFile::from_path(&path)
        .map(Some)
        .map_err(|e| e.to_ipc_error())
}

/// Starts a crunch job for the given input file.
///
/// One job at a time: a submission while another job is active is
/// rejected. Progress and the terminal outcome are delivered via the
/// `crunch:*` events.
#[tauri::command]
#[specta::specta]
pub async fn start_crunch(
    input_path: String,
    state: State<'_, AppState>,
    ffmpeg_state: State<'_, SharedFFmpegState>,
    app: AppHandle,
) -> Result<StartedCrunch, String> {
    let input = PathBuf::from(&input_path);
    if !input.exists() {
        return Err(CoreError::FileNotFound(input_path).to_ipc_error());
    }

    let runner = {
        let guard = ffmpeg_state.read().await;
        guard
            .runner()
            .cloned()
            .ok_or_else(|| "FFmpeg not available".to_string())?
    };

    let spec = {
        let settings = state.settings.lock().await;
        CrunchSpec::new(&input, &settings.encode).map_err(|e| e.to_ipc_error())?
    };

    state
        .active_job
        .try_begin(&spec.id)
        .map_err(|e| e.to_ipc_error())?;

    let (tx, rx) = mpsc::channel(32);

    let job_spec = spec.clone();
    tauri::async_runtime::spawn(async move {
        run_crunch(&runner, &job_spec, tx).await;
    });

    let job_id = spec.id.clone();
    let app_handle = app.clone();
    tauri::async_runtime::spawn(async move {
        EventEmitter::relay_job_events(&app_handle, &job_id, rx).await;

        // The stream is closed, so the terminal event has been relayed.
        let state = app_handle.state::<AppState>();
        state.active_job.finish(&job_id);
    });

    Ok(StartedCrunch {
        job_id: spec.id,
        output_path: spec.output_path.display().to_string(),
    })
}

/// Check if FFmpeg is available and return its status
#[tauri::command]
#[specta::specta]
pub async fn check_ffmpeg(
    ffmpeg_state: State<'_, SharedFFmpegState>,
) -> Result<FFmpegStatus, String> {
    let state = ffmpeg_state.read().await;

    if let Some(info) = state.info() {
        Ok(FFmpegStatus {
            available: true,
            version: Some(info.version.clone()),
            is_bundled: info.is_bundled,
            ffmpeg_path: Some(info.ffmpeg_path.to_string_lossy().to_string()),
            ffprobe_path: Some(info.ffprobe_path.to_string_lossy().to_string()),
        })
    } else {
        Ok(FFmpegStatus {
            available: false,
            version: None,
            is_bundled: false,
            ffmpeg_path: None,
            ffprobe_path: None,
        })
    }
}

/// Returns the current application settings.
#[tauri::command]
#[specta::specta]
pub async fn get_settings(state: State<'_, AppState>) -> Result<AppSettings, String> {
    Ok(state.settings.lock().await.clone())
}

/// Replaces the application settings, persisting them to disk.
#[tauri::command]
#[specta::specta]
pub async fn update_settings(
    new_settings: AppSettings,
    state: State<'_, AppState>,
    app: AppHandle,
) -> Result<AppSettings, String> {
    let mut normalized = new_settings;
    normalized.normalize();

    let dir = app
        .path()
        .app_data_dir()
        .map_err(|e| format!("Failed to resolve app data dir: {e}"))?;
    normalized.save(&dir).map_err(|e| e.to_ipc_error())?;

    let mut guard = state.settings.lock().await;
    *guard = normalized.clone();

    Ok(normalized)
}

/// Quits the application immediately, with no pending-job drain.
#[tauri::command]
#[specta::specta]
pub fn quit_app(app: AppHandle) {
    app.exit(0);
}
