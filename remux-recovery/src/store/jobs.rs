//! Durable job tracker
//!
//! Jobs are persisted in `pending` before they become visible to any
//! caller, mutate only through forward transitions, and are retained
//! indefinitely for audit: `get` must succeed for any id ever handed out,
//! including after a process restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use remux_protocol::{JobStatus, RecoveryJob, ReplayReport, RestoreOptions};
use remux_utils::{RemuxError, Result};

use super::disk;

const FILE_NAME: &str = "jobs.bin";

/// Durable tracker of restore jobs
#[derive(Debug)]
pub struct JobTracker {
    path: PathBuf,
    jobs: HashMap<String, RecoveryJob>,
}

impl JobTracker {
    /// Open the tracker in `dir`, loading any existing jobs
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(FILE_NAME);
        let rows: Vec<RecoveryJob> = disk::load(&path)?.unwrap_or_default();
        let jobs: HashMap<String, RecoveryJob> =
            rows.into_iter().map(|j| (j.id.clone(), j)).collect();
        debug!("Opened job tracker: {} jobs", jobs.len());
        Ok(Self { path, jobs })
    }

    /// Create a new pending job, persisted before it is returned
    pub fn create(&mut self, snapshot_id: u64, options: &RestoreOptions) -> Result<RecoveryJob> {
        let job = RecoveryJob::new(snapshot_id, options);
        self.jobs.insert(job.id.clone(), job.clone());
        self.persist()?;
        info!(
            "Created recovery job {} for snapshot {} (mode={}, policy={})",
            job.id,
            snapshot_id,
            job.mode.as_str(),
            job.conflict_policy.as_str()
        );
        Ok(job)
    }

    /// Get a job by id
    pub fn get(&self, id: &str) -> Result<RecoveryJob> {
        self.jobs
            .get(id)
            .cloned()
            .ok_or_else(|| RemuxError::JobNotFound(id.to_string()))
    }

    /// Move a job forward to `new_status`
    ///
    /// Fails with `InvalidTransition` unless the move is strictly forward;
    /// a terminal job never changes again. `result` and `error` are stored
    /// with terminal transitions; `started_at`/`finished_at` are stamped
    /// here.
    pub fn transition(
        &mut self,
        id: &str,
        new_status: JobStatus,
        result: Option<ReplayReport>,
        error: Option<String>,
    ) -> Result<RecoveryJob> {
        let job = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| RemuxError::JobNotFound(id.to_string()))?;

        if !job.status.can_transition_to(new_status) {
            return Err(RemuxError::InvalidTransition {
                from: job.status.to_string(),
                to: new_status.to_string(),
            });
        }

        job.status = new_status;
        match new_status {
            JobStatus::Running => job.started_at = Some(Utc::now()),
            JobStatus::Succeeded | JobStatus::Failed => {
                job.finished_at = Some(Utc::now());
                job.result = result;
                job.error = error;
            }
            JobStatus::Pending => unreachable!("no transition targets pending"),
        }

        let job = job.clone();
        self.persist()?;
        debug!("Job {} -> {}", id, new_status);
        Ok(job)
    }

    /// Count of jobs still pending
    pub fn pending_count(&self) -> usize {
        self.jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending)
            .count()
    }

    /// Count of jobs that failed since `since`
    pub fn failures_since(&self, since: DateTime<Utc>) -> usize {
        self.jobs
            .values()
            .filter(|j| {
                j.status == JobStatus::Failed
                    && j.finished_at.map(|t| t >= since).unwrap_or(false)
            })
            .count()
    }

    /// Ids of jobs left non-terminal by a previous process
    ///
    /// A restart can strand jobs in `pending` (never dequeued) or
    /// `running` (worker died mid-replay); the orchestrator fails them on
    /// startup so pollers are not left waiting forever.
    pub fn unfinished_ids(&self) -> Vec<String> {
        self.jobs
            .values()
            .filter(|j| !j.status.is_terminal())
            .map(|j| j.id.clone())
            .collect()
    }

    /// Total job count
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the tracker holds no jobs
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let rows: Vec<&RecoveryJob> = self.jobs.values().collect();
        disk::save(&self.path, &rows)
    }
}
