//! Mediacrunch Core Type Definitions
//!
//! Defines fundamental types used throughout the project.
//! IPC-visible types are exported to TypeScript via tauri-specta.

// =============================================================================
// ID Types
// =============================================================================

/// Job unique identifier (ULID)
pub type JobId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Generates a new unique job ID.
pub fn new_job_id() -> JobId {
    ulid::Ulid::new().to_string()
}
