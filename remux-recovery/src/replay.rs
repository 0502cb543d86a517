//! Replay/conflict engine
//!
//! Reconstructs a session's window/pane topology from a snapshot, given
//! whatever now lives under the target name. The engine holds no lock
//! across adapter calls: live sessions can be mutated by unrelated
//! operator actions between steps, so collision checks are re-issued
//! rather than assumed to still hold.
//!
//! Failure handling is the accumulator pattern: every fallible sub-step
//! appends to the report's `partial_failures` instead of aborting, and
//! the job fails only when the target session itself cannot be
//! created or obtained.

use std::sync::Arc;

use tracing::{debug, info, warn};

use remux_protocol::{
    ConflictPolicy, PanePreview, PartialFailure, ReplayMode, ReplayReport, RestoreOptions,
    Snapshot, UnmatchedPane, WindowRecord,
};
use remux_utils::{RemuxError, Result};

use crate::adapter::{AdapterError, LivePane, MuxAdapter};

/// Upper bound on rename-policy candidate names before giving up
const MAX_RENAME_ATTEMPTS: usize = 100;

/// Replays snapshots onto the live multiplexer
pub struct ReplayEngine {
    adapter: Arc<dyn MuxAdapter>,
}

impl ReplayEngine {
    /// Create an engine over the shared adapter
    pub fn new(adapter: Arc<dyn MuxAdapter>) -> Self {
        Self { adapter }
    }

    /// Replay a snapshot according to the requested options
    ///
    /// Returns the replay report on success; an error here fails the
    /// whole job (conflict under the abort policy, or a target session
    /// that could not be created).
    pub fn replay(&self, snapshot: &Snapshot, options: &RestoreOptions) -> Result<ReplayReport> {
        let target = if options.target_session.is_empty() {
            snapshot.session_name.as_str()
        } else {
            options.target_session.as_str()
        };

        let exists = self.adapter.session_exists(target).map_err(RemuxError::from)?;

        if !exists {
            // No conflict to resolve; policy is irrelevant
            debug!("No live session '{}', replaying fresh", target);
            return self.replay_fresh(snapshot, target, None, Vec::new());
        }

        match (options.mode, options.conflict_policy) {
            (ReplayMode::ContentOnly, _) => self.content_diff(snapshot, target),
            (ReplayMode::Full, ConflictPolicy::Abort) => Err(RemuxError::conflict(format!(
                "session '{}' already exists",
                target
            ))),
            (ReplayMode::Full, ConflictPolicy::Overwrite) => {
                let failures = self.destroy_live(target);
                self.replay_fresh(snapshot, target, None, failures)
            }
            (ReplayMode::Full, ConflictPolicy::Rename) => self.replay_renamed(snapshot, target),
        }
    }

    /// Create `name` fresh and replay the full topology into it
    fn replay_fresh(
        &self,
        snapshot: &Snapshot,
        name: &str,
        renamed_from: Option<String>,
        seed_failures: Vec<PartialFailure>,
    ) -> Result<ReplayReport> {
        let mut report = ReplayReport {
            session_name: name.to_string(),
            renamed_from,
            structure_created: true,
            partial_failures: seed_failures,
            ..Default::default()
        };

        let first_cwd = snapshot
            .windows
            .first()
            .and_then(|w| w.panes.first())
            .and_then(|p| p.current_path.as_deref());

        self.adapter
            .create_session(name, first_cwd)
            .map_err(|e| match e {
                AdapterError::AlreadyExists(_) => RemuxError::conflict(format!(
                    "session '{}' was created concurrently",
                    name
                )),
                other => RemuxError::from(other),
            })?;

        self.replay_structure(snapshot, name, &mut report);

        info!(
            "Replayed snapshot {} into '{}': {} windows, {} panes, {} partial failures",
            snapshot.id,
            name,
            report.windows_created,
            report.panes_created,
            report.partial_failures.len()
        );

        Ok(report)
    }

    /// Rename policy: find a collision-free `target-N` and replay there
    ///
    /// Existence is re-checked per candidate and a create that races into
    /// `AlreadyExists` moves on to the next candidate, so the final name
    /// is collision-free at creation time.
    fn replay_renamed(&self, snapshot: &Snapshot, target: &str) -> Result<ReplayReport> {
        let first_cwd = snapshot
            .windows
            .first()
            .and_then(|w| w.panes.first())
            .and_then(|p| p.current_path.as_deref());

        for n in 2..2 + MAX_RENAME_ATTEMPTS {
            let candidate = format!("{}-{}", target, n);

            if self
                .adapter
                .session_exists(&candidate)
                .map_err(RemuxError::from)?
            {
                continue;
            }

            match self.adapter.create_session(&candidate, first_cwd) {
                Ok(()) => {
                    debug!("Rename policy resolved '{}' -> '{}'", target, candidate);
                    let mut report = ReplayReport {
                        session_name: candidate.clone(),
                        renamed_from: Some(target.to_string()),
                        structure_created: true,
                        ..Default::default()
                    };
                    self.replay_structure(snapshot, &candidate, &mut report);
                    return Ok(report);
                }
                // Lost a race for this name; try the next suffix
                Err(AdapterError::AlreadyExists(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(RemuxError::conflict(format!(
            "no collision-free name found for '{}' after {} attempts",
            target, MAX_RENAME_ATTEMPTS
        )))
    }

    /// Replay windows and panes into a freshly created session
    ///
    /// The session already has window 0 with a single pane; the first
    /// snapshot window reuses it. Creation order follows snapshot order
    /// exactly, which fixes the index assignment on the live side.
    fn replay_structure(&self, snapshot: &Snapshot, name: &str, report: &mut ReplayReport) {
        for (wi, window) in snapshot.windows.iter().enumerate() {
            let window_index = if wi == 0 {
                if let Err(e) = self.adapter.rename_window(name, 0, &window.name) {
                    report.partial_failures.push(window_failure(wi, "rename_window", &e));
                }
                0
            } else {
                let cwd = window.panes.first().and_then(|p| p.current_path.as_deref());
                match self.adapter.new_window(name, &window.name, cwd) {
                    Ok(index) => index,
                    Err(e) => {
                        warn!("Failed to create window '{}': {}", window.name, e);
                        report.partial_failures.push(window_failure(wi, "new_window", &e));
                        continue;
                    }
                }
            };
            report.windows_created += 1;

            self.replay_panes(window, wi, name, window_index, report);

            if let Some(layout) = &window.layout {
                if let Err(e) = self.adapter.select_layout(name, window_index, layout) {
                    report.partial_failures.push(window_failure(wi, "select_layout", &e));
                }
            }
        }
    }

    /// Replay the panes of one window, in snapshot order
    fn replay_panes(
        &self,
        window: &WindowRecord,
        wi: usize,
        name: &str,
        window_index: usize,
        report: &mut ReplayReport,
    ) {
        for (pi, pane) in window.panes.iter().enumerate() {
            let pane_index = if pi == 0 {
                // The window was created with its first pane
                0
            } else {
                match self
                    .adapter
                    .split_pane(name, window_index, pane.current_path.as_deref())
                {
                    Ok(index) => index,
                    Err(e) => {
                        warn!("Failed to split pane {} of window {}: {}", pi, wi, e);
                        report.partial_failures.push(pane_failure(wi, pi, "split_pane", &e));
                        continue;
                    }
                }
            };
            report.panes_created += 1;

            if let Some(title) = &pane.title {
                if let Err(e) = self.adapter.rename_pane(name, window_index, pane_index, title)
                {
                    report.partial_failures.push(pane_failure(wi, pi, "rename_pane", &e));
                }
            }

            if !pane.tail_preview.is_empty() {
                report.previews.push(PanePreview {
                    window_index: wi,
                    pane_index: pi,
                    title: pane.title.clone(),
                    tail_preview: pane.tail_preview.clone(),
                });
            }
        }
    }

    /// Best-effort teardown of a live session before overwrite
    ///
    /// Continues past individual deletion errors and records them; a
    /// not-found along the way just means someone else got there first.
    fn destroy_live(&self, name: &str) -> Vec<PartialFailure> {
        let mut failures = Vec::new();

        match self.adapter.list_windows(name) {
            Ok(windows) => {
                // Highest index first, so earlier kills do not shift later ones
                for window in windows.iter().rev() {
                    if let Err(e) = self.adapter.kill_window(name, window.index) {
                        if !e.is_not_found() {
                            warn!("Failed to kill window {} of '{}': {}", window.index, name, e);
                            // Teardown is scoped to live windows, not snapshot
                            // indices, so no index is recorded
                            failures.push(PartialFailure {
                                window_index: None,
                                pane_index: None,
                                operation: "kill_window".to_string(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
            Err(e) => {
                if !e.is_not_found() {
                    failures.push(PartialFailure {
                        window_index: None,
                        pane_index: None,
                        operation: "list_windows".to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Killing the last window usually takes the session with it
        if let Err(e) = self.adapter.kill_session(name) {
            if !e.is_not_found() {
                warn!("Failed to kill session '{}': {}", name, e);
                failures.push(PartialFailure {
                    window_index: None,
                    pane_index: None,
                    operation: "kill_session".to_string(),
                    error: e.to_string(),
                });
            }
        }

        failures
    }

    /// Content-only mode: no structure is touched; report captured panes
    /// with no live counterpart
    fn content_diff(&self, snapshot: &Snapshot, target: &str) -> Result<ReplayReport> {
        let windows = self.adapter.list_windows(target).map_err(RemuxError::from)?;

        let mut live_panes: Vec<LivePane> = Vec::new();
        for window in &windows {
            live_panes.extend(
                self.adapter
                    .list_panes(target, window.index)
                    .map_err(RemuxError::from)?,
            );
        }

        let mut report = ReplayReport {
            session_name: target.to_string(),
            structure_created: false,
            ..Default::default()
        };

        for (wi, window) in snapshot.windows.iter().enumerate() {
            for (pi, pane) in window.panes.iter().enumerate() {
                let matched = live_panes.iter().any(|live| {
                    (pane.current_path.is_some() && live.current_path == pane.current_path)
                        || (pane.title.is_some() && live.title == pane.title)
                });
                if !matched {
                    report.unmatched_panes.push(UnmatchedPane {
                        window_index: wi,
                        pane_index: pi,
                        title: pane.title.clone(),
                        current_path: pane.current_path.clone(),
                        tail_preview: pane.tail_preview.clone(),
                    });
                }
            }
        }

        debug!(
            "Content diff of snapshot {} against '{}': {} unmatched pane(s)",
            snapshot.id,
            target,
            report.unmatched_panes.len()
        );

        Ok(report)
    }
}

fn window_failure(wi: usize, operation: &str, error: &AdapterError) -> PartialFailure {
    PartialFailure {
        window_index: Some(wi),
        pane_index: None,
        operation: operation.to_string(),
        error: error.to_string(),
    }
}

fn pane_failure(wi: usize, pi: usize, operation: &str, error: &AdapterError) -> PartialFailure {
    PartialFailure {
        window_index: Some(wi),
        pane_index: Some(pi),
        operation: operation.to_string(),
        error: error.to_string(),
    }
}
