//! Build script for Mediacrunch
//!
//! Wires Tauri build resources for GUI builds. Headless builds (CLI,
//! library tests) skip the Tauri step entirely.

fn main() {
    if std::env::var("CARGO_FEATURE_GUI").is_ok() {
        tauri_build::build();
    }
}
