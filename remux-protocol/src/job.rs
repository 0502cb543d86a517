//! Recovery job types
//!
//! A job is a durable, asynchronously executed unit of restore work with
//! an observable status. Status transitions are strictly monotonic:
//! pending -> running -> succeeded | failed. Once terminal, a job is
//! immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observable status of a recovery job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created and queued, not yet claimed by a worker
    Pending,
    /// Claimed by exactly one worker, replay in progress
    Running,
    /// Replay finished with a usable target session
    Succeeded,
    /// Replay failed; see the job's error message
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Whether a transition to `next` moves strictly forward
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    /// Wire string form ("pending", "running", "succeeded", "failed")
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a snapshot is replayed onto live state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayMode {
    /// Recreate the session's complete window/pane topology
    #[default]
    Full,
    /// Create no structure; report captured panes with no live counterpart
    ContentOnly,
}

impl ReplayMode {
    /// Parse the wire form, rejecting unrecognized values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(ReplayMode::Full),
            "content-only" => Some(ReplayMode::ContentOnly),
            _ => None,
        }
    }

    /// Wire string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayMode::Full => "full",
            ReplayMode::ContentOnly => "content-only",
        }
    }
}

/// What to do when a live session already exists under the target name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Destroy conflicting live structure before recreating
    Overwrite,
    /// Recreate under a disambiguated name, live session untouched
    Rename,
    /// Fail the whole job on first collision
    #[default]
    Abort,
}

impl ConflictPolicy {
    /// Parse the wire form, rejecting unrecognized values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overwrite" => Some(ConflictPolicy::Overwrite),
            "rename" => Some(ConflictPolicy::Rename),
            "abort" => Some(ConflictPolicy::Abort),
            _ => None,
        }
    }

    /// Wire string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Rename => "rename",
            ConflictPolicy::Abort => "abort",
        }
    }
}

/// Options supplied with a restore request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RestoreOptions {
    /// Target session name; empty means the snapshot's own session name
    #[serde(default)]
    pub target_session: String,
    /// Replay mode
    #[serde(default)]
    pub mode: ReplayMode,
    /// Conflict policy
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// One recorded best-effort failure during replay
///
/// Accumulated instead of aborting, so the job result carries a complete
/// audit trail of everything that did not go to plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartialFailure {
    /// Window index in the snapshot, when the failure was window-scoped
    pub window_index: Option<usize>,
    /// Pane index in the snapshot, when the failure was pane-scoped
    pub pane_index: Option<usize>,
    /// Adapter operation that failed (e.g. "new_window", "kill_pane")
    pub operation: String,
    /// Adapter error message
    pub error: String,
}

/// Captured tail preview for one replayed pane
///
/// Surfaced in the job result for operator reference; preview text is
/// never injected into the live terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanePreview {
    /// Window index in the snapshot
    pub window_index: usize,
    /// Pane index in the snapshot
    pub pane_index: usize,
    /// Captured pane title
    pub title: Option<String>,
    /// Captured tail preview, plain text
    pub tail_preview: String,
}

/// A captured pane with no counterpart in the live session (content-only mode)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnmatchedPane {
    /// Window index in the snapshot
    pub window_index: usize,
    /// Pane index in the snapshot
    pub pane_index: usize,
    /// Captured pane title
    pub title: Option<String>,
    /// Captured working directory
    pub current_path: Option<String>,
    /// Captured tail preview, for operator reference
    pub tail_preview: String,
}

/// Summary of what a finished replay created, skipped, or renamed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReplayReport {
    /// Final session name the replay targeted (differs under rename)
    pub session_name: String,
    /// Original target when the rename policy picked a different name
    pub renamed_from: Option<String>,
    /// Whether any structure was created (false in content-only mode)
    pub structure_created: bool,
    /// Windows successfully created
    pub windows_created: usize,
    /// Panes successfully created
    pub panes_created: usize,
    /// Captured panes with no live counterpart (content-only mode)
    pub unmatched_panes: Vec<UnmatchedPane>,
    /// Tail previews of replayed panes, for operator reference
    pub previews: Vec<PanePreview>,
    /// Best-effort failures recorded during replay
    pub partial_failures: Vec<PartialFailure>,
}

/// A durable, asynchronously executed restore job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryJob {
    /// Globally unique id, safe to embed in URLs and log lines
    pub id: String,
    /// Snapshot being restored
    pub snapshot_id: u64,
    /// Requested target session ("" = snapshot's session name)
    pub target_session: String,
    /// Replay mode
    pub mode: ReplayMode,
    /// Conflict policy
    pub conflict_policy: ConflictPolicy,
    /// Current status
    pub status: JobStatus,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When a worker claimed the job
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
    /// Replay report, set on success
    pub result: Option<ReplayReport>,
    /// Error message, set on failure
    pub error: Option<String>,
}

impl RecoveryJob {
    /// Create a new pending job for a snapshot
    pub fn new(snapshot_id: u64, options: &RestoreOptions) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            snapshot_id,
            target_session: options.target_session.clone(),
            mode: options.mode,
            conflict_policy: options.conflict_policy,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
        }
    }

    /// Whether the job has reached a terminal status
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_forward_only() {
        use JobStatus::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Succeeded));
        assert!(Running.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Succeeded));
        assert!(!Pending.can_transition_to(Failed));
        assert!(!Running.can_transition_to(Pending));
        assert!(!Succeeded.can_transition_to(Failed));
        assert!(!Succeeded.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Succeeded));
        assert!(!Failed.can_transition_to(Running));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Succeeded).unwrap(),
            "\"succeeded\""
        );
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_replay_mode_wire_form() {
        assert_eq!(serde_json::to_string(&ReplayMode::Full).unwrap(), "\"full\"");
        assert_eq!(
            serde_json::to_string(&ReplayMode::ContentOnly).unwrap(),
            "\"content-only\""
        );

        let mode: ReplayMode = serde_json::from_str("\"content-only\"").unwrap();
        assert_eq!(mode, ReplayMode::ContentOnly);
    }

    #[test]
    fn test_unrecognized_mode_rejected() {
        // Unknown strings must fail instead of silently defaulting
        let result: Result<ReplayMode, _> = serde_json::from_str("\"partial\"");
        assert!(result.is_err());

        let result: Result<ConflictPolicy, _> = serde_json::from_str("\"merge\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(ReplayMode::parse("full"), Some(ReplayMode::Full));
        assert_eq!(ReplayMode::parse("content-only"), Some(ReplayMode::ContentOnly));
        assert_eq!(ReplayMode::parse("FULL"), None);

        assert_eq!(ConflictPolicy::parse("rename"), Some(ConflictPolicy::Rename));
        assert_eq!(ConflictPolicy::parse("abort"), Some(ConflictPolicy::Abort));
        assert_eq!(ConflictPolicy::parse("keep"), None);
    }

    #[test]
    fn test_new_job_is_pending_with_unique_id() {
        let options = RestoreOptions::default();
        let a = RecoveryJob::new(1, &options);
        let b = RecoveryJob::new(1, &options);

        assert_eq!(a.status, JobStatus::Pending);
        assert!(a.started_at.is_none());
        assert!(a.finished_at.is_none());
        assert!(a.result.is_none());
        assert!(a.error.is_none());
        assert_ne!(a.id, b.id);
        // UUIDs are URL-safe as-is
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit() || c == '-'));
    }

    #[test]
    fn test_restore_options_defaults() {
        let options: RestoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.target_session, "");
        assert_eq!(options.mode, ReplayMode::Full);
        assert_eq!(options.conflict_policy, ConflictPolicy::Abort);
    }

    #[test]
    fn test_job_bincode_roundtrip() {
        let mut job = RecoveryJob::new(
            9,
            &RestoreOptions {
                target_session: "build".to_string(),
                mode: ReplayMode::Full,
                conflict_policy: ConflictPolicy::Rename,
            },
        );
        job.status = JobStatus::Succeeded;
        job.result = Some(ReplayReport {
            session_name: "build-2".to_string(),
            renamed_from: Some("build".to_string()),
            structure_created: true,
            windows_created: 2,
            panes_created: 4,
            unmatched_panes: Vec::new(),
            previews: Vec::new(),
            partial_failures: vec![PartialFailure {
                window_index: Some(1),
                pane_index: None,
                operation: "new_window".to_string(),
                error: "command failed".to_string(),
            }],
        });

        let bytes = bincode::serialize(&job).unwrap();
        let decoded: RecoveryJob = bincode::deserialize(&bytes).unwrap();
        assert_eq!(job, decoded);
    }
}
