//! remux-recovery: Session recovery engine
//!
//! Everything the console needs to bring dead sessions back: snapshot
//! capture with retention, a durable killed-session ledger, and an async
//! restore pipeline that replays window/pane topology onto the live
//! multiplexer through a pluggable adapter.
//!
//! [`RecoveryManager`] is the entry point; open it over a [`MuxAdapter`]
//! and an [`EventSink`], then call [`RecoveryManager::start`] to spawn
//! the restore workers.

pub mod adapter;
pub mod capture;
pub mod config;
pub mod events;
pub mod orchestrator;
pub mod replay;
pub mod scrollback;
pub mod store;

#[cfg(test)]
mod testing;

pub use adapter::{AdapterError, AdapterResult, LivePane, LiveWindow, MuxAdapter};
pub use capture::SessionCapturer;
pub use config::RecoveryConfig;
pub use events::{BroadcastEventSink, EventSink, NullEventSink};
pub use orchestrator::{RecoveryManager, RecoveryOverview};
pub use replay::ReplayEngine;
pub use scrollback::ScrollbackCodec;
pub use store::{JobTracker, KilledSessionLedger, SnapshotStore};
