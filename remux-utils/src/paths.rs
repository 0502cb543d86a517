//! Path utilities for remux
//!
//! Handles XDG Base Directory specification compliance for config,
//! state, and data directories.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const APP_NAME: &str = "remux";

/// Get project directories
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/remux` or `~/.config/remux`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".config").join(APP_NAME))
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/remux/recovery.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("recovery.toml")
}

/// Get the state directory (persistent state like stores and logs)
///
/// Location: `$XDG_STATE_HOME/remux` or `~/.local/state/remux`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| home_dir().join(".local").join("state").join(APP_NAME))
}

/// Get the data directory (durable recovery stores)
///
/// Location: `$XDG_DATA_HOME/remux` or `~/.local/share/remux`
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".local").join("share").join(APP_NAME))
}

/// Get the recovery store directory
///
/// Location: `$XDG_DATA_HOME/remux/recovery`
pub fn recovery_dir() -> PathBuf {
    data_dir().join("recovery")
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/remux/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Get the runtime directory
///
/// Location: `$XDG_RUNTIME_DIR/remux` or `/tmp/remux-$UID`
pub fn runtime_dir() -> PathBuf {
    if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(xdg_runtime).join(APP_NAME)
    } else {
        // Fallback to /tmp with UID for security
        // SAFETY: getuid() is always safe to call
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/{}-{}", APP_NAME, uid))
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
