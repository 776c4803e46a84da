//! Tauri Event Emission Module
//!
//! Broadcasts crunch job notifications to the frontend via Tauri's event
//! system. A job emits zero or more progress events followed by exactly
//! one terminal event.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::JobId;

// =============================================================================
// Event Types
// =============================================================================

/// Event names used for frontend communication
pub mod event_names {
    /// Fractional encode progress
    pub const CRUNCH_PROGRESS: &str = "crunch:progress";
    /// Job completed; payload carries the output path
    pub const CRUNCH_COMPLETED: &str = "crunch:completed";
    /// Job failed; payload carries the reason
    pub const CRUNCH_FAILED: &str = "crunch:failed";
}

// =============================================================================
// Event Payloads
// =============================================================================

/// Crunch progress event payload
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CrunchProgressEvent {
    /// Job ID
    pub job_id: JobId,
    /// Progress percentage (0-100)
    pub percent: f32,
}

/// Crunch completed event payload
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CrunchCompletedEvent {
    /// Job ID
    pub job_id: JobId,
    /// Path of the produced file
    pub output_path: String,
}

/// Crunch failed event payload
#[derive(Clone, Debug, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CrunchFailedEvent {
    /// Job ID
    pub job_id: JobId,
    /// Error message
    pub error: String,
}

// =============================================================================
// Event Emitter
// =============================================================================

/// Event emitter for broadcasting crunch notifications
#[cfg(all(feature = "gui", not(test)))]
pub struct EventEmitter;

#[cfg(all(feature = "gui", not(test)))]
impl EventEmitter {
    /// Emits a crunch progress event
    pub fn emit_crunch_progress(
        app: &tauri::AppHandle,
        job_id: &str,
        percent: f32,
    ) -> Result<(), String> {
        use tauri::Emitter;

        let event = CrunchProgressEvent {
            job_id: job_id.to_string(),
            percent,
        };
        app.emit(event_names::CRUNCH_PROGRESS, &event)
            .map_err(|e| format!("Failed to emit crunch progress event: {}", e))
    }

    /// Emits a crunch completed event
    pub fn emit_crunch_completed(
        app: &tauri::AppHandle,
        job_id: &str,
        output_path: &str,
    ) -> Result<(), String> {
        use tauri::Emitter;

        let event = CrunchCompletedEvent {
            job_id: job_id.to_string(),
            output_path: output_path.to_string(),
        };
        app.emit(event_names::CRUNCH_COMPLETED, &event)
            .map_err(|e| format!("Failed to emit crunch completed event: {}", e))
    }

    /// Emits a crunch failed event
    pub fn emit_crunch_failed(
        app: &tauri::AppHandle,
        job_id: &str,
        error: &str,
    ) -> Result<(), String> {
        use tauri::Emitter;

        let event = CrunchFailedEvent {
            job_id: job_id.to_string(),
            error: error.to_string(),
        };
        app.emit(event_names::CRUNCH_FAILED, &event)
            .map_err(|e| format!("Failed to emit crunch failed event: {}", e))
    }

    /// Consumes a job's event stream and relays each event to the
    /// frontend. Returns once the stream closes (terminal event sent).
    pub async fn relay_job_events(
        app: &tauri::AppHandle,
        job_id: &str,
        mut rx: tokio::sync::mpsc::Receiver<crate::core::crunch::CrunchEvent>,
    ) {
        use crate::core::crunch::CrunchEvent;

        while let Some(event) = rx.recv().await {
            let result = match &event {
                CrunchEvent::Progress { percent } => {
                    Self::emit_crunch_progress(app, job_id, *percent)
                }
                CrunchEvent::Completed { output_path } => {
                    Self::emit_crunch_completed(app, job_id, &output_path.display().to_string())
                }
                CrunchEvent::Failed { message } => Self::emit_crunch_failed(app, job_id, message),
            };

            if let Err(e) = result {
                tracing::warn!("{}", e);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = CrunchProgressEvent {
            job_id: "job_001".to_string(),
            percent: 75.5,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("jobId"));
        assert!(json.contains("75.5"));
    }

    #[test]
    fn test_completed_event_serialization() {
        let event = CrunchCompletedEvent {
            job_id: "job_001".to_string(),
            output_path: "/media/crunched_1722945600123.mp4".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("outputPath"));
        assert!(json.contains("crunched_1722945600123.mp4"));
    }

    #[test]
    fn test_failed_event_serialization() {
        let event = CrunchFailedEvent {
            job_id: "job_001".to_string(),
            error: "Could not analyze file.".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Could not analyze file."));
    }
}
