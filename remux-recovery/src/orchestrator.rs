//! Recovery orchestrator
//!
//! The facade the rest of the console talks to: snapshot capture, the
//! killed-session ledger, and the async restore pipeline. Restores are
//! durable jobs pushed onto a bounded queue and executed by a small pool
//! of workers; the replay itself is synchronous adapter work, so each
//! worker runs it on the blocking pool under the configured timeout.
//!
//! Store locks are sync and never held across an await point.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use remux_protocol::{
    JobStatus, KilledSession, RecoveryEvent, RecoveryJob, ReplayReport, RestoreOptions, Snapshot,
};
use remux_utils::{names, paths, RemuxError, Result};

use crate::adapter::MuxAdapter;
use crate::capture::SessionCapturer;
use crate::config::RecoveryConfig;
use crate::events::EventSink;
use crate::replay::ReplayEngine;
use crate::scrollback::ScrollbackCodec;
use crate::store::{JobTracker, KilledSessionLedger, SnapshotStore};

/// Aggregate counters for the console landing view
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RecoveryOverview {
    /// Killed sessions still awaiting review
    pub killed_count: usize,
    /// Snapshots held across all sessions
    pub snapshot_count: usize,
    /// Restore jobs queued but not yet claimed
    pub pending_jobs: usize,
    /// Restore jobs that failed in the last 24 hours
    pub recent_failures: usize,
}

struct Inner {
    config: RecoveryConfig,
    adapter: Arc<dyn MuxAdapter>,
    events: Arc<dyn EventSink>,
    snapshots: Mutex<SnapshotStore>,
    ledger: Mutex<KilledSessionLedger>,
    jobs: Mutex<JobTracker>,
    capturer: SessionCapturer,
}

/// Owns the durable stores and the restore worker pool
pub struct RecoveryManager {
    inner: Arc<Inner>,
    queue_tx: mpsc::Sender<String>,
    // Taken by start(); the queue lives on after that
    queue_rx: Mutex<Option<mpsc::Receiver<String>>>,
}

impl RecoveryManager {
    /// Open the durable stores and prepare the restore queue
    ///
    /// Jobs left non-terminal by a previous process are failed here, so a
    /// poller holding an old job id sees a terminal answer instead of a
    /// job that never finishes. Workers do not run until `start`.
    pub fn new(
        config: RecoveryConfig,
        adapter: Arc<dyn MuxAdapter>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let state_dir = config.state_dir();
        paths::ensure_dir(&state_dir).map_err(|e| RemuxError::FileWrite {
            path: state_dir.clone(),
            source: e,
        })?;

        let snapshots = SnapshotStore::open(&state_dir, config.retain_per_session)?;
        let ledger = KilledSessionLedger::open(&state_dir)?;
        let mut jobs = JobTracker::open(&state_dir)?;

        let stranded = jobs.unfinished_ids();
        for id in &stranded {
            if let Err(e) = fail_stranded(&mut jobs, id) {
                warn!("Could not fail stranded job {}: {}", id, e);
            }
        }
        if !stranded.is_empty() {
            info!("Failed {} job(s) stranded by a previous process", stranded.len());
        }

        let (queue_tx, queue_rx) = mpsc::channel(config.queue_depth);
        let capturer = SessionCapturer::new(
            adapter.clone(),
            config.capture_lines,
            config.tail_preview_lines,
        );

        info!(
            "Recovery manager ready: {} snapshots, {} ledger entries, {} jobs",
            snapshots.count(),
            ledger.len(),
            jobs.len()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                adapter,
                events,
                snapshots: Mutex::new(snapshots),
                ledger: Mutex::new(ledger),
                jobs: Mutex::new(jobs),
                capturer,
            }),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
        })
    }

    /// Spawn the restore worker pool
    ///
    /// Idempotent; calling again after the workers are running is a no-op.
    /// Must run inside a tokio runtime.
    pub fn start(&self) {
        let Some(queue_rx) = self.queue_rx.lock().take() else {
            debug!("Restore workers already started");
            return;
        };

        let shared_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));
        for worker in 0..self.inner.config.workers {
            let inner = self.inner.clone();
            let rx = shared_rx.clone();
            tokio::spawn(async move {
                debug!("Restore worker {} started", worker);
                loop {
                    let job_id = rx.lock().await.recv().await;
                    let Some(job_id) = job_id else {
                        debug!("Restore worker {} shutting down", worker);
                        break;
                    };
                    execute_job(&inner, &job_id).await;
                }
            });
        }
    }

    /// Capture a snapshot of a live session
    pub fn capture_session(&self, session_name: &str) -> Result<Snapshot> {
        names::validate_session_name(session_name)?;
        let windows = self.inner.capturer.capture(session_name)?;
        self.inner.snapshots.lock().capture(session_name, windows)
    }

    /// Record a killed session in the ledger, capturing it first when possible
    ///
    /// Meant to be called just before the session is torn down. The capture
    /// is best-effort: a session that is already gone, or a capture that
    /// fails mid-kill, still leaves a ledger entry behind.
    pub fn record_killed_session(&self, session_name: &str) -> Result<KilledSession> {
        names::validate_session_name(session_name)?;

        match self.inner.capturer.capture(session_name) {
            Ok(windows) => {
                if let Err(e) = self.inner.snapshots.lock().capture(session_name, windows) {
                    warn!("Parting capture of '{}' not persisted: {}", session_name, e);
                }
            }
            Err(e) => {
                warn!("Could not capture '{}' before kill: {}", session_name, e);
            }
        }

        let count = self.inner.snapshots.lock().count_for(session_name);
        self.inner.ledger.lock().record(session_name, count)
    }

    /// List killed sessions, most recently killed first
    pub fn killed_sessions(&self) -> Vec<KilledSession> {
        self.inner.ledger.lock().list()
    }

    /// Mark a killed session as reviewed and archived
    ///
    /// Ledger-only: snapshots are retained and the live multiplexer is not
    /// touched. Idempotent.
    pub fn archive_session(&self, session_name: &str) -> Result<KilledSession> {
        names::validate_session_name(session_name)?;
        let count = self.inner.snapshots.lock().count_for(session_name);
        let entry = self.inner.ledger.lock().archive(session_name, count)?;
        self.inner.events.publish(RecoveryEvent::SessionArchived {
            session: session_name.to_string(),
        });
        Ok(entry)
    }

    /// Drop a session from the ledger along with all of its snapshots
    ///
    /// Returns whether anything was removed.
    pub fn dismiss_session(&self, session_name: &str) -> Result<bool> {
        names::validate_session_name(session_name)?;
        let removed_snapshots = self.inner.snapshots.lock().remove_session(session_name)?;
        let removed_entry = self.inner.ledger.lock().remove(session_name)?;
        Ok(removed_entry || removed_snapshots > 0)
    }

    /// List snapshots for a session, newest first
    pub fn list_snapshots(&self, session_name: &str, limit: i64) -> Result<Vec<Snapshot>> {
        if session_name.is_empty() {
            return Err(RemuxError::invalid_argument("session name is empty"));
        }
        Ok(self.inner.snapshots.lock().list(session_name, limit))
    }

    /// Get a snapshot by id
    pub fn get_snapshot(&self, id: u64) -> Result<Snapshot> {
        self.inner.snapshots.lock().get(id)
    }

    /// Decode the captured scrollback of one pane in a snapshot
    pub fn pane_scrollback(
        &self,
        snapshot_id: u64,
        window_index: usize,
        pane_index: usize,
    ) -> Result<Vec<String>> {
        let snapshot = self.get_snapshot(snapshot_id)?;
        let pane = snapshot
            .windows
            .get(window_index)
            .and_then(|w| w.panes.get(pane_index))
            .ok_or_else(|| {
                RemuxError::invalid_argument(format!(
                    "snapshot {} has no pane {}.{}",
                    snapshot_id, window_index, pane_index
                ))
            })?;

        match &pane.scrollback {
            Some(blob) => ScrollbackCodec::new(0).decode(blob),
            None => Ok(Vec::new()),
        }
    }

    /// Queue an asynchronous restore of a snapshot
    ///
    /// Validates up front and returns the pending job immediately; the
    /// outcome is observed through `get_job` or the event sink. A full
    /// queue rejects the request as unavailable without creating a job.
    pub fn restore_snapshot(
        &self,
        snapshot_id: u64,
        options: RestoreOptions,
    ) -> Result<RecoveryJob> {
        // Existence and argument checks happen before anything durable
        self.inner.snapshots.lock().get(snapshot_id)?;
        if !options.target_session.is_empty() {
            names::validate_session_name(&options.target_session)?;
        }

        let permit = self.queue_tx.try_reserve().map_err(|_| {
            warn!("Restore queue full, rejecting restore of snapshot {}", snapshot_id);
            RemuxError::unavailable("restore queue is full, retry shortly")
        })?;

        let job = self.inner.jobs.lock().create(snapshot_id, &options)?;
        permit.send(job.id.clone());
        Ok(job)
    }

    /// Get a restore job by id
    pub fn get_job(&self, id: &str) -> Result<RecoveryJob> {
        self.inner.jobs.lock().get(id)
    }

    /// Aggregate counters for the console landing view
    pub fn overview(&self) -> RecoveryOverview {
        let killed_count = self
            .inner
            .ledger
            .lock()
            .list()
            .iter()
            .filter(|e| !e.archived)
            .count();
        let jobs = self.inner.jobs.lock();

        RecoveryOverview {
            killed_count,
            snapshot_count: self.inner.snapshots.lock().count(),
            pending_jobs: jobs.pending_count(),
            recent_failures: jobs.failures_since(Utc::now() - chrono::Duration::hours(24)),
        }
    }
}

/// Run one claimed job to a terminal status
async fn execute_job(inner: &Arc<Inner>, job_id: &str) {
    // Claiming is the transition itself: losing a double claim is a no-op
    let job = match inner
        .jobs
        .lock()
        .transition(job_id, JobStatus::Running, None, None)
    {
        Ok(job) => job,
        Err(RemuxError::InvalidTransition { .. }) => {
            debug!("Job {} already claimed, skipping", job_id);
            return;
        }
        Err(e) => {
            warn!("Could not claim job {}: {}", job_id, e);
            return;
        }
    };

    let outcome = run_replay(inner, &job).await;

    let (status, result, error) = match outcome {
        Ok(report) => (JobStatus::Succeeded, Some(report), None),
        Err(e) => (JobStatus::Failed, None, Some(e.to_string())),
    };

    // A session recreated under its own name is no longer killed; a rename
    // leaves the original entry awaiting review
    let recreated = result.as_ref().and_then(|r| {
        (r.structure_created && r.renamed_from.is_none()).then(|| r.session_name.clone())
    });

    if let Err(e) = inner.jobs.lock().transition(job_id, status, result, error) {
        error!("Could not finish job {}: {}", job_id, e);
        return;
    }

    if let Some(name) = recreated {
        match inner.ledger.lock().remove(&name) {
            Ok(true) => debug!("Cleared ledger entry for restored session '{}'", name),
            Ok(false) => {}
            Err(e) => warn!("Could not clear ledger entry for '{}': {}", name, e),
        }
    }

    info!("Job {} finished: {}", job_id, status);
    inner.events.publish(RecoveryEvent::JobFinished {
        job_id: job_id.to_string(),
        status,
    });
}

/// Execute the replay on the blocking pool under the configured timeout
///
/// On timeout the job fails and any partially created structure is left
/// as-is for the operator.
async fn run_replay(inner: &Arc<Inner>, job: &RecoveryJob) -> Result<ReplayReport> {
    let snapshot = inner.snapshots.lock().get(job.snapshot_id)?;
    let options = RestoreOptions {
        target_session: job.target_session.clone(),
        mode: job.mode,
        conflict_policy: job.conflict_policy,
    };

    let engine = ReplayEngine::new(inner.adapter.clone());
    let timeout = Duration::from_secs(inner.config.job_timeout_secs);

    let replay = tokio::task::spawn_blocking(move || engine.replay(&snapshot, &options));

    match tokio::time::timeout(timeout, replay).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RemuxError::internal(format!(
            "replay task aborted: {}",
            join_err
        ))),
        Err(_) => Err(RemuxError::internal(format!(
            "replay timed out after {}s, partial structure may remain",
            inner.config.job_timeout_secs
        ))),
    }
}

/// Force a job left over from a previous process into `failed`
fn fail_stranded(jobs: &mut JobTracker, id: &str) -> Result<()> {
    let job = jobs.get(id)?;
    if job.status == JobStatus::Pending {
        jobs.transition(id, JobStatus::Running, None, None)?;
    }
    jobs.transition(
        id,
        JobStatus::Failed,
        None,
        Some("interrupted by restart".to_string()),
    )?;
    Ok(())
}
