//! Snapshot and ledger types
//!
//! A snapshot is an immutable point-in-time record of a session's
//! window/pane topology plus best-effort captured scrollback. Snapshots
//! are created once at capture time and never mutated; retention pruning
//! is the only thing that removes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Captured state of a single pane
///
/// `pane_id` is the multiplexer's pane identifier at capture time. It is
/// unique within the snapshot only and carries no meaning after restore:
/// replayed panes get fresh ids from the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaneRecord {
    /// Pane index within the window at capture time
    pub index: usize,
    /// Multiplexer pane id at capture time (e.g. "%12")
    pub pane_id: String,
    /// Terminal title
    pub title: Option<String>,
    /// Current working directory
    pub current_path: Option<String>,
    /// Command the pane was started with
    pub start_command: Option<String>,
    /// Command running at capture time
    pub current_command: Option<String>,
    /// Last few lines of visible output, plain text
    pub tail_preview: String,
    /// Whether this was the active pane in its window
    pub active: bool,
    /// Full captured scrollback, compressed (None when capture was skipped)
    #[serde(default)]
    pub scrollback: Option<ScrollbackBlob>,
}

/// Captured state of a single window, panes in capture order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowRecord {
    /// Window index within the session at capture time
    pub index: usize,
    /// Window name
    pub name: String,
    /// Layout hint as reported by the multiplexer
    pub layout: Option<String>,
    /// Panes in capture order
    pub panes: Vec<PaneRecord>,
}

/// An immutable captured record of a session at one point in time
///
/// `id` is assigned by the snapshot store at insert and never reused.
/// Window ordering is stable capture order and determines replay order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Store-assigned identifier, strictly increasing
    pub id: u64,
    /// Name of the session the snapshot was captured from
    pub session_name: String,
    /// Capture timestamp
    pub captured_at: DateTime<Utc>,
    /// Windows in capture order
    pub windows: Vec<WindowRecord>,
}

impl Snapshot {
    /// Total pane count across all windows
    pub fn pane_count(&self) -> usize {
        self.windows.iter().map(|w| w.panes.len()).sum()
    }

    /// Window count
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

/// Compressed scrollback contents for one pane
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrollbackBlob {
    /// Total lines captured
    pub line_count: usize,
    /// Compressed newline-separated text
    pub compressed_data: Vec<u8>,
    /// Compression method used
    pub compression: CompressionMethod,
}

/// Compression method for scrollback data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    /// No compression
    #[default]
    None,
    /// LZ4 compression (fast)
    Lz4,
}

/// Ledger entry for a session that has been killed or archived
///
/// Tracked independently of snapshots so the console can show
/// "recoverable" sessions even when capture failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KilledSession {
    /// Session name
    pub session_name: String,
    /// When the session was observed gone (refreshed on re-record)
    pub killed_at: DateTime<Utc>,
    /// Denormalized count of snapshots held for this name
    pub snapshot_count: usize,
    /// Explicitly archived by an operator, vs. killed and awaiting review
    pub archived: bool,
}
