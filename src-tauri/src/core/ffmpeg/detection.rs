//! FFmpeg Detection Module
//!
//! Handles detection and validation of FFmpeg/FFprobe binaries.
//! Supports bundled (sidecar) binaries, an explicit directory override from
//! settings, and system-installed binaries.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::process::configure_std_command;

use super::{FFmpegError, FFmpegResult};

/// Information about detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary
    pub ffprobe_path: PathBuf,
    /// FFmpeg version string
    pub version: String,
    /// Whether this is a bundled (sidecar) installation
    pub is_bundled: bool,
}

/// Platform-specific binary names for ffmpeg and ffprobe.
fn binary_names() -> (&'static str, &'static str) {
    #[cfg(target_os = "windows")]
    return ("ffmpeg.exe", "ffprobe.exe");

    #[cfg(not(target_os = "windows"))]
    ("ffmpeg", "ffprobe")
}

/// Detect FFmpeg from bundled sidecar binaries
///
/// Looks for FFmpeg binaries bundled with the application in the
/// `binaries/` directory relative to the app resources.
#[cfg(feature = "gui")]
pub fn detect_bundled_ffmpeg(app_handle: &tauri::AppHandle) -> FFmpegResult<FFmpegInfo> {
    use tauri::Manager;

    let resource_dir = app_handle
        .path()
        .resource_dir()
        .map_err(|_| FFmpegError::NotFound)?;

    let mut info = detect_ffmpeg_in_dir(&resource_dir.join("binaries"))?;
    info.is_bundled = true;
    Ok(info)
}

/// Detect FFmpeg binaries in an explicit directory (settings override).
pub fn detect_ffmpeg_in_dir(dir: &Path) -> FFmpegResult<FFmpegInfo> {
    let (ffmpeg_name, ffprobe_name) = binary_names();
    let ffmpeg_path = dir.join(ffmpeg_name);
    let ffprobe_path = dir.join(ffprobe_name);

    if !ffmpeg_path.exists() || !ffprobe_path.exists() {
        return Err(FFmpegError::NotFound);
    }

    let version = get_ffmpeg_version(&ffmpeg_path)?;
    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
        is_bundled: false,
    })
}

/// Detect FFmpeg from system PATH
///
/// Searches well-known install locations first, then the PATH environment.
pub fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    let (ffmpeg_name, ffprobe_name) = binary_names();

    let ffmpeg_path = which_tool(ffmpeg_name)?;
    let ffprobe_path = which_tool(ffprobe_name)?;

    let version = get_ffmpeg_version(&ffmpeg_path)?;

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
        is_bundled: false,
    })
}

/// Find a binary in well-known locations, falling back to a PATH search
/// using `where` (Windows) or `which` (Unix).
fn which_tool(binary_name: &str) -> FFmpegResult<PathBuf> {
    for dir in get_common_ffmpeg_paths() {
        let candidate = dir.join(binary_name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    #[cfg(target_os = "windows")]
    let finder = "where";

    #[cfg(not(target_os = "windows"))]
    let finder = "which";

    let mut cmd = Command::new(finder);
    cmd.arg(binary_name);
    configure_std_command(&mut cmd);

    let output = cmd.output().map_err(|_| FFmpegError::NotFound)?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        // `where` can print multiple matches; take the first.
        if let Some(first_line) = path_str.lines().next() {
            let trimmed = first_line.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }
    }

    Err(FFmpegError::NotFound)
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files (x86)\ffmpeg\bin"));

        // Chocolatey installation
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }

        // Scoop installation
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        // Homebrew paths
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin")); // MacPorts
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

/// Get FFmpeg version string
fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let mut cmd = Command::new(ffmpeg_path);
    cmd.arg("-version");
    configure_std_command(&mut cmd);

    let output = cmd.output().map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    let output_str = String::from_utf8_lossy(&output.stdout);

    // Parse version from first line: "ffmpeg version X.X.X ..."
    if let Some(first_line) = output_str.lines().next() {
        if let Some(version_part) = first_line.strip_prefix("ffmpeg version ") {
            if let Some(version) = version_part.split_whitespace().next() {
                return Ok(version.to_string());
            }
        }
        // Return the whole first line if parsing fails
        return Ok(first_line.to_string());
    }

    Err(FFmpegError::ParseError(
        "Could not parse FFmpeg version".to_string(),
    ))
}

/// Validate that FFmpeg binaries are functional
pub fn validate_ffmpeg(info: &FFmpegInfo) -> FFmpegResult<()> {
    for path in [&info.ffmpeg_path, &info.ffprobe_path] {
        let mut cmd = Command::new(path);
        cmd.arg("-version");
        configure_std_command(&mut cmd);

        let output = cmd.output().map_err(FFmpegError::ProcessError)?;

        if !output.status.success() {
            return Err(FFmpegError::ExecutionFailed(format!(
                "Binary is not functional: {}",
                path.display()
            )));
        }
    }

    Ok(())
}
