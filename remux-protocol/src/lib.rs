//! remux-protocol: Shared recovery data types
//!
//! This crate defines the data structures exchanged between the recovery
//! engine, its durable stores, and the transport layer that embeds it:
//! captured session snapshots, the killed-session ledger rows, restore
//! jobs and their replay reports, and the events fanned out on job
//! completion.

pub mod events;
pub mod job;
pub mod snapshot;

// Re-export main types at crate root
pub use events::RecoveryEvent;
pub use job::{
    ConflictPolicy, JobStatus, PanePreview, PartialFailure, RecoveryJob, ReplayMode,
    ReplayReport, RestoreOptions, UnmatchedPane,
};
pub use snapshot::{
    CompressionMethod, KilledSession, PaneRecord, ScrollbackBlob, Snapshot, WindowRecord,
};
