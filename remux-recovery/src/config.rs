//! Recovery engine configuration
//!
//! Loaded from a TOML file under the XDG config dir; every field has a
//! default so an absent or partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use remux_utils::{paths, RemuxError, Result};

/// Configuration for the recovery engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Number of worker tasks executing restore jobs
    pub workers: usize,
    /// Bounded job queue depth; overflow rejects restores as unavailable
    pub queue_depth: usize,
    /// Per-job timeout in seconds; on expiry the job fails and partial
    /// structure is left as-is
    pub job_timeout_secs: u64,
    /// Snapshots kept per session name, newest first; 0 keeps all
    pub retain_per_session: usize,
    /// Scrollback lines captured per pane
    pub capture_lines: usize,
    /// Lines of captured scrollback kept as the plain-text tail preview
    pub tail_preview_lines: usize,
    /// Override for the durable store directory (defaults to the XDG data dir)
    pub state_dir: Option<PathBuf>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_depth: 64,
            job_timeout_secs: 60,
            retain_per_session: 10,
            capture_lines: 1000,
            tail_preview_lines: 10,
            state_dir: None,
        }
    }
}

impl RecoveryConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| RemuxError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RecoveryConfig = toml::from_str(&contents)
            .map_err(|e| RemuxError::config(format!("invalid recovery config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the default config file, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        let path = paths::config_file();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RemuxError::config("workers must be at least 1"));
        }
        if self.queue_depth == 0 {
            return Err(RemuxError::config("queue_depth must be at least 1"));
        }
        if self.job_timeout_secs == 0 {
            return Err(RemuxError::config("job_timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Directory holding the durable stores
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(paths::recovery_dir)
    }
}
