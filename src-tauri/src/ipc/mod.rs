//! IPC (Inter-Process Communication) Module
//!
//! Handles communication between the Tauri backend and the frontend.
//! All Tauri commands and events are defined here.

mod dto;
mod events;

pub use dto::*;
pub use events::*;

#[cfg(all(feature = "gui", not(test)))]
mod commands;

#[cfg(all(feature = "gui", not(test)))]
pub use commands::*;
