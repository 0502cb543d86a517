//! Recovery events
//!
//! Fire-and-forget notifications published to the event hub. Delivery is
//! at-most-once and best-effort: pollers must be able to reach the same
//! end state through GetJob, so losing an event is never a correctness
//! problem.

use serde::{Deserialize, Serialize};

use crate::job::JobStatus;

/// Event published by the recovery orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryEvent {
    /// A restore job reached a terminal status
    JobFinished {
        job_id: String,
        status: JobStatus,
    },
    /// A session was archived in the ledger
    SessionArchived {
        session: String,
    },
}
