//! TypeScript bindings exporter (tauri-specta).
//!
//! This binary generates `src/bindings.ts` from the Rust command/type
//! surface. It is intentionally kept out of the main app runtime path.

use std::path::PathBuf;

use specta_typescript::Typescript;
use tauri_specta::Builder;

fn main() {
    // Collect all commands exposed to the frontend.
    let mut builder = Builder::<tauri::Wry>::new().commands(mediacrunch_lib::collect_commands!());

    // Event payloads are emitted via stringly-typed event names; make the
    // payload types available to the frontend type system anyway.
    builder = builder
        .typ::<mediacrunch_lib::ipc::CrunchProgressEvent>()
        .typ::<mediacrunch_lib::ipc::CrunchCompletedEvent>()
        .typ::<mediacrunch_lib::ipc::CrunchFailedEvent>()
        .typ::<mediacrunch_lib::ipc::SelectedFile>()
        .typ::<mediacrunch_lib::ipc::StartedCrunch>()
        .typ::<mediacrunch_lib::ipc::FFmpegStatus>();

    let out_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("src")
        .join("bindings.ts");

    builder
        .export(Typescript::default(), &out_path)
        .expect("failed to export TypeScript bindings");

    println!("Bindings exported to {}", out_path.display());
}
