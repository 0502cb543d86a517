//! Durable snapshot store
//!
//! Snapshots are keyed by an auto-incrementing id that is never reused,
//! even across restarts: the high-water mark persists with the table.
//! Capture always inserts a new immutable record; retention pruning is
//! the only mutation besides session-wide removal.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use remux_protocol::{Snapshot, WindowRecord};
use remux_utils::{RemuxError, Result};

use super::disk;

/// Default list limit when the caller passes a non-positive one
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Hard upper bound on list sizes, a resource-protection contract
pub const MAX_LIST_LIMIT: i64 = 200;

const FILE_NAME: &str = "snapshots.bin";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotTable {
    next_id: u64,
    snapshots: Vec<Snapshot>,
}

/// Durable store of captured session snapshots
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    table: SnapshotTable,
    /// Snapshots kept per session name; 0 keeps all
    retain_per_session: usize,
}

impl SnapshotStore {
    /// Open the store in `dir`, loading any existing table
    pub fn open(dir: impl AsRef<Path>, retain_per_session: usize) -> Result<Self> {
        let path = dir.as_ref().join(FILE_NAME);
        let table: SnapshotTable = disk::load(&path)?.unwrap_or_else(|| SnapshotTable {
            next_id: 1,
            snapshots: Vec::new(),
        });

        debug!(
            "Opened snapshot store: {} snapshots, next id {}",
            table.snapshots.len(),
            table.next_id
        );

        Ok(Self {
            path,
            table,
            retain_per_session,
        })
    }

    /// Insert a new immutable snapshot for `session_name`
    ///
    /// Never mutates an existing record; capturing the same session twice
    /// in a row yields two snapshots. Retention pruning for that session
    /// runs after the insert.
    pub fn capture(&mut self, session_name: &str, windows: Vec<WindowRecord>) -> Result<Snapshot> {
        let snapshot = Snapshot {
            id: self.table.next_id,
            session_name: session_name.to_string(),
            captured_at: Utc::now(),
            windows,
        };
        self.table.next_id += 1;
        self.table.snapshots.push(snapshot.clone());

        let pruned = self.prune_retention(session_name);
        self.persist()?;

        info!(
            "Captured snapshot {} for session '{}' ({} windows, {} pruned)",
            snapshot.id,
            session_name,
            snapshot.windows.len(),
            pruned
        );

        Ok(snapshot)
    }

    /// List snapshots for a session, newest first
    ///
    /// `limit <= 0` clamps to the default (20); anything above the hard
    /// bound clamps to 200.
    pub fn list(&self, session_name: &str, limit: i64) -> Vec<Snapshot> {
        let limit = if limit <= 0 {
            DEFAULT_LIST_LIMIT
        } else {
            limit.min(MAX_LIST_LIMIT)
        } as usize;

        let mut matching: Vec<&Snapshot> = self
            .table
            .snapshots
            .iter()
            .filter(|s| s.session_name == session_name)
            .collect();
        // Ids break ties between captures within the same instant
        matching.sort_by(|a, b| (b.captured_at, b.id).cmp(&(a.captured_at, a.id)));
        matching.into_iter().take(limit).cloned().collect()
    }

    /// Get a snapshot by id
    pub fn get(&self, id: u64) -> Result<Snapshot> {
        self.table
            .snapshots
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(RemuxError::SnapshotNotFound(id))
    }

    /// Total snapshot count
    pub fn count(&self) -> usize {
        self.table.snapshots.len()
    }

    /// Snapshot count for one session name
    pub fn count_for(&self, session_name: &str) -> usize {
        self.table
            .snapshots
            .iter()
            .filter(|s| s.session_name == session_name)
            .count()
    }

    /// Remove every snapshot for a session (operator dismissal)
    pub fn remove_session(&mut self, session_name: &str) -> Result<usize> {
        let before = self.table.snapshots.len();
        self.table
            .snapshots
            .retain(|s| s.session_name != session_name);
        let removed = before - self.table.snapshots.len();
        if removed > 0 {
            self.persist()?;
            info!(
                "Removed {} snapshot(s) for session '{}'",
                removed, session_name
            );
        }
        Ok(removed)
    }

    /// Drop the oldest snapshots for a session beyond the retention limit
    fn prune_retention(&mut self, session_name: &str) -> usize {
        if self.retain_per_session == 0 {
            return 0;
        }

        let mut ids: Vec<(chrono::DateTime<Utc>, u64)> = self
            .table
            .snapshots
            .iter()
            .filter(|s| s.session_name == session_name)
            .map(|s| (s.captured_at, s.id))
            .collect();
        if ids.len() <= self.retain_per_session {
            return 0;
        }

        // Newest first; everything past the retention window goes
        ids.sort_by(|a, b| b.cmp(a));
        let doomed: Vec<u64> = ids[self.retain_per_session..]
            .iter()
            .map(|(_, id)| *id)
            .collect();
        self.table.snapshots.retain(|s| !doomed.contains(&s.id));
        doomed.len()
    }

    fn persist(&self) -> Result<()> {
        disk::save(&self.path, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_protocol::PaneRecord;

    fn window(name: &str, panes: usize) -> WindowRecord {
        WindowRecord {
            index: 0,
            name: name.to_string(),
            layout: None,
            panes: (0..panes)
                .map(|i| PaneRecord {
                    index: i,
                    pane_id: format!("%{}", i),
                    title: None,
                    current_path: None,
                    start_command: None,
                    current_command: None,
                    tail_preview: String::new(),
                    active: i == 0,
                    scrollback: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_capture_assigns_increasing_ids() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();

        let a = store.capture("build", vec![window("main", 1)]).unwrap();
        let b = store.capture("build", vec![window("main", 1)]).unwrap();
        let c = store.capture("other", vec![window("main", 1)]).unwrap();

        assert!(a.id < b.id);
        assert!(b.id < c.id);
    }

    #[test]
    fn test_get_roundtrip_is_lossless() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();

        let mut w = window("editor", 3);
        w.panes[1].tail_preview = "cargo test ... ok".to_string();
        w.panes[2].title = Some("htop".to_string());

        let captured = store.capture("build", vec![w, window("logs", 1)]).unwrap();
        let fetched = store.get(captured.id).unwrap();

        assert_eq!(captured, fetched);
        assert_eq!(fetched.windows[0].panes[1].tail_preview, "cargo test ... ok");
        assert_eq!(fetched.windows[1].name, "logs");
    }

    #[test]
    fn test_get_unknown_id_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = SnapshotStore::open(temp.path(), 0).unwrap();
        let err = store.get(42).unwrap_err();
        assert!(matches!(err, RemuxError::SnapshotNotFound(42)));
    }

    #[test]
    fn test_list_newest_first_and_scoped_to_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();

        let a = store.capture("build", vec![window("w", 1)]).unwrap();
        let b = store.capture("build", vec![window("w", 1)]).unwrap();
        store.capture("other", vec![window("w", 1)]).unwrap();
        let c = store.capture("build", vec![window("w", 1)]).unwrap();

        let listed = store.list("build", 10);
        let ids: Vec<u64> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
        assert!(listed.iter().all(|s| s.session_name == "build"));
    }

    #[test]
    fn test_list_limit_clamping() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();

        for _ in 0..30 {
            store.capture("build", vec![window("w", 1)]).unwrap();
        }

        // Non-positive limit clamps to the default
        assert_eq!(store.list("build", 0).len(), 20);
        assert_eq!(store.list("build", -5).len(), 20);
        assert_eq!(store.list("build", 3).len(), 3);
        // Oversized limit clamps to the hard bound
        assert_eq!(store.list("build", 10_000).len(), 30);
    }

    #[test]
    fn test_retention_keeps_newest() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 3).unwrap();

        let mut last = 0;
        for _ in 0..6 {
            last = store.capture("build", vec![window("w", 1)]).unwrap().id;
        }

        assert_eq!(store.count_for("build"), 3);
        let listed = store.list("build", 10);
        assert_eq!(listed[0].id, last);
        // Other sessions are untouched by retention for "build"
        store.capture("other", vec![window("w", 1)]).unwrap();
        assert_eq!(store.count_for("other"), 1);
    }

    #[test]
    fn test_reopen_preserves_snapshots_and_ids() {
        let temp = tempfile::TempDir::new().unwrap();

        let (a_id, b_id) = {
            let mut store = SnapshotStore::open(temp.path(), 0).unwrap();
            let a = store.capture("build", vec![window("w", 2)]).unwrap();
            let b = store.capture("build", vec![window("w", 1)]).unwrap();
            (a.id, b.id)
        };

        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(a_id).unwrap().windows[0].panes.len(), 2);

        // Ids keep increasing after reopen, never reused
        let c = store.capture("build", vec![window("w", 1)]).unwrap();
        assert!(c.id > b_id);
    }

    #[test]
    fn test_remove_session() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut store = SnapshotStore::open(temp.path(), 0).unwrap();

        store.capture("build", vec![window("w", 1)]).unwrap();
        store.capture("build", vec![window("w", 1)]).unwrap();
        store.capture("other", vec![window("w", 1)]).unwrap();

        assert_eq!(store.remove_session("build").unwrap(), 2);
        assert_eq!(store.count_for("build"), 0);
        assert_eq!(store.count_for("other"), 1);
        assert_eq!(store.remove_session("build").unwrap(), 0);
    }
}
