//! Killed-session ledger
//!
//! Tracks sessions that have been terminated or archived, independent of
//! whether any snapshot exists for them, so the console can always show
//! what is recoverable. One entry per session name.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use remux_protocol::KilledSession;
use remux_utils::Result;

use super::disk;

const FILE_NAME: &str = "ledger.bin";

/// Durable ledger of killed and archived sessions
#[derive(Debug)]
pub struct KilledSessionLedger {
    path: PathBuf,
    entries: Vec<KilledSession>,
}

impl KilledSessionLedger {
    /// Open the ledger in `dir`, loading any existing entries
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(FILE_NAME);
        let entries: Vec<KilledSession> = disk::load(&path)?.unwrap_or_default();
        debug!("Opened killed-session ledger: {} entries", entries.len());
        Ok(Self { path, entries })
    }

    /// Record that a session was killed
    ///
    /// Idempotent: re-recording an existing entry refreshes `killed_at`
    /// and the snapshot count instead of duplicating. A previously
    /// archived entry returns to the awaiting-review state, since the
    /// session evidently existed again.
    pub fn record(&mut self, session_name: &str, snapshot_count: usize) -> Result<KilledSession> {
        let now = Utc::now();
        let entry = match self.entries.iter_mut().find(|e| e.session_name == session_name) {
            Some(existing) => {
                existing.killed_at = now;
                existing.snapshot_count = snapshot_count;
                existing.archived = false;
                existing.clone()
            }
            None => {
                let entry = KilledSession {
                    session_name: session_name.to_string(),
                    killed_at: now,
                    snapshot_count,
                    archived: false,
                };
                self.entries.push(entry.clone());
                entry
            }
        };

        self.persist()?;
        info!(
            "Recorded killed session '{}' ({} snapshots)",
            session_name, snapshot_count
        );
        Ok(entry)
    }

    /// List entries, most recently killed first
    pub fn list(&self) -> Vec<KilledSession> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.killed_at.cmp(&a.killed_at));
        entries
    }

    /// Get one entry by session name
    pub fn get(&self, session_name: &str) -> Option<KilledSession> {
        self.entries
            .iter()
            .find(|e| e.session_name == session_name)
            .cloned()
    }

    /// Mark a session archived
    ///
    /// Idempotent: archiving twice is a no-op success. Archiving a name
    /// with no entry creates one, so an archive issued as a side effect of
    /// deletion still leaves a ledger row behind.
    pub fn archive(&mut self, session_name: &str, snapshot_count: usize) -> Result<KilledSession> {
        let entry = match self.entries.iter_mut().find(|e| e.session_name == session_name) {
            Some(existing) => {
                if existing.archived {
                    debug!("Session '{}' already archived", session_name);
                    return Ok(existing.clone());
                }
                existing.archived = true;
                existing.snapshot_count = snapshot_count;
                existing.clone()
            }
            None => {
                let entry = KilledSession {
                    session_name: session_name.to_string(),
                    killed_at: Utc::now(),
                    snapshot_count,
                    archived: true,
                };
                self.entries.push(entry.clone());
                entry
            }
        };

        self.persist()?;
        info!("Archived session '{}'", session_name);
        Ok(entry)
    }

    /// Refresh the denormalized snapshot count for an entry, if present
    pub fn set_snapshot_count(&mut self, session_name: &str, count: usize) -> Result<()> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.session_name == session_name)
        {
            if entry.snapshot_count != count {
                entry.snapshot_count = count;
                self.persist()?;
            }
        }
        Ok(())
    }

    /// Remove an entry entirely (operator dismissal)
    ///
    /// Returns whether an entry existed.
    pub fn remove(&mut self, session_name: &str) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.session_name != session_name);
        let removed = self.entries.len() != before;
        if removed {
            self.persist()?;
            info!("Dismissed killed session '{}'", session_name);
        }
        Ok(removed)
    }

    /// Entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        disk::save(&self.path, &self.entries)
    }
}
