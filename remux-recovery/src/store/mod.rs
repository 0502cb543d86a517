//! Durable stores for the recovery engine
//!
//! Three small bincode-backed tables: snapshots, the killed-session
//! ledger, and the job tracker. The orchestrator owns all three
//! exclusively; nothing else writes to them.

mod disk;
mod jobs;
mod ledger;
mod snapshots;

pub use jobs::JobTracker;
pub use ledger::KilledSessionLedger;
pub use snapshots::{SnapshotStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
