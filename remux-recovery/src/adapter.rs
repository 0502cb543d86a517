//! Terminal-multiplexer adapter interface
//!
//! The recovery engine never talks to the multiplexer binary directly; it
//! drives this trait. The adapter is a shared, ownerless collaborator:
//! other parts of the console mutate sessions through it concurrently, so
//! every call here must be safe to interleave with unrelated session
//! mutations and the engine re-validates state rather than assuming a
//! prior observation still holds.

use remux_utils::RemuxError;

/// Adapter-specific failure kinds
///
/// The replay engine maps all of these into partial-failure or abort
/// handling; none of them escape a job as-is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("multiplexer binary unavailable: {0}")]
    BinaryUnavailable(String),

    #[error("command failed: {0}")]
    CommandFailed(String),
}

impl AdapterError {
    /// Whether this failure means the referenced object is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound(_))
    }

    /// Whether this failure means a same-named object already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AdapterError::AlreadyExists(_))
    }
}

impl From<AdapterError> for RemuxError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound(what) => RemuxError::SessionNotFound(what),
            AdapterError::AlreadyExists(what) => RemuxError::SessionExists(what),
            other => RemuxError::adapter(other.to_string()),
        }
    }
}

/// Result type for adapter calls
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// A live window as reported by the multiplexer
#[derive(Debug, Clone, PartialEq)]
pub struct LiveWindow {
    pub index: usize,
    pub name: String,
    pub layout: Option<String>,
}

/// A live pane as reported by the multiplexer
#[derive(Debug, Clone, PartialEq)]
pub struct LivePane {
    pub index: usize,
    pub pane_id: String,
    pub title: Option<String>,
    pub current_path: Option<String>,
    pub start_command: Option<String>,
    pub current_command: Option<String>,
    pub active: bool,
}

/// Commands the recovery engine issues against the live multiplexer
///
/// Implementations wrap the real multiplexer CLI (out of scope here); the
/// engine only requires that each call is independently fallible and that
/// session creation is exclusive per name (two racing creates: one wins,
/// the other sees `AlreadyExists`).
pub trait MuxAdapter: Send + Sync {
    /// List all live session names
    fn list_sessions(&self) -> AdapterResult<Vec<String>>;

    /// Check whether a session exists under this name
    fn session_exists(&self, name: &str) -> AdapterResult<bool>;

    /// Create a session; its first window holds a single pane
    fn create_session(&self, name: &str, cwd: Option<&str>) -> AdapterResult<()>;

    /// Kill an entire session
    fn kill_session(&self, name: &str) -> AdapterResult<()>;

    /// List windows of a session, in index order
    fn list_windows(&self, session: &str) -> AdapterResult<Vec<LiveWindow>>;

    /// List panes of a window, in index order
    fn list_panes(&self, session: &str, window_index: usize) -> AdapterResult<Vec<LivePane>>;

    /// Create a window with a single pane; returns the assigned index
    fn new_window(&self, session: &str, name: &str, cwd: Option<&str>) -> AdapterResult<usize>;

    /// Kill a window
    fn kill_window(&self, session: &str, window_index: usize) -> AdapterResult<()>;

    /// Rename a window
    fn rename_window(&self, session: &str, window_index: usize, name: &str) -> AdapterResult<()>;

    /// Apply a layout hint to a window
    fn select_layout(&self, session: &str, window_index: usize, layout: &str) -> AdapterResult<()>;

    /// Split an additional pane into a window; returns the assigned pane index
    fn split_pane(
        &self,
        session: &str,
        window_index: usize,
        cwd: Option<&str>,
    ) -> AdapterResult<usize>;

    /// Kill a pane
    fn kill_pane(&self, session: &str, window_index: usize, pane_index: usize)
        -> AdapterResult<()>;

    /// Set a pane's title
    fn rename_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        title: &str,
    ) -> AdapterResult<()>;

    /// Capture up to `max_lines` of a pane's visible text and scrollback
    fn capture_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        max_lines: usize,
    ) -> AdapterResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(AdapterError::NotFound("build".into()).is_not_found());
        assert!(!AdapterError::CommandFailed("exit 1".into()).is_not_found());
        assert!(AdapterError::AlreadyExists("build".into()).is_already_exists());
        assert!(!AdapterError::NotFound("build".into()).is_already_exists());
    }

    #[test]
    fn test_error_mapping_to_remux() {
        let err: RemuxError = AdapterError::NotFound("build".into()).into();
        assert!(matches!(err, RemuxError::SessionNotFound(_)));

        let err: RemuxError = AdapterError::AlreadyExists("build".into()).into();
        assert!(matches!(err, RemuxError::SessionExists(_)));

        let err: RemuxError = AdapterError::BinaryUnavailable("tmux not on PATH".into()).into();
        assert!(matches!(err, RemuxError::Adapter(_)));

        let err: RemuxError = AdapterError::CommandFailed("exit 1".into()).into();
        assert!(matches!(err, RemuxError::Adapter(_)));
    }
}
