//! In-memory multiplexer fake for tests
//!
//! Mimics the observable semantics the engine relies on: session creation
//! is exclusive per name and makes one window with one pane, window and
//! pane indices are positional, and killing shifts later indices down.
//! Structural mutations are counted so tests can assert that abort-policy
//! replays touch nothing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::adapter::{AdapterError, AdapterResult, LivePane, LiveWindow, MuxAdapter};

#[derive(Debug, Clone, Default)]
pub struct FakePane {
    pub pane_id: String,
    pub title: Option<String>,
    pub current_path: Option<String>,
    pub start_command: Option<String>,
    pub current_command: Option<String>,
    pub active: bool,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWindow {
    pub name: String,
    pub layout: Option<String>,
    pub panes: Vec<FakePane>,
}

#[derive(Debug, Default)]
pub struct FakeMux {
    sessions: Mutex<HashMap<String, Vec<FakeWindow>>>,
    fail_ops: Mutex<HashSet<String>>,
    stall_ops: Mutex<HashMap<String, Duration>>,
    mutations: AtomicUsize,
    next_pane_id: AtomicUsize,
}

impl FakeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pane with a path and title
    pub fn pane(path: Option<&str>, title: Option<&str>) -> FakePane {
        FakePane {
            pane_id: String::new(),
            title: title.map(|t| t.to_string()),
            current_path: path.map(|p| p.to_string()),
            start_command: None,
            current_command: Some("zsh".to_string()),
            active: false,
            content: Vec::new(),
        }
    }

    /// Build a window from panes
    pub fn window(name: &str, layout: Option<&str>, panes: Vec<FakePane>) -> FakeWindow {
        FakeWindow {
            name: name.to_string(),
            layout: layout.map(|l| l.to_string()),
            panes,
        }
    }

    /// Seed a live session directly, bypassing the mutation counter
    pub fn add_session(&self, name: &str, mut windows: Vec<FakeWindow>) {
        for window in &mut windows {
            for pane in &mut window.panes {
                if pane.pane_id.is_empty() {
                    pane.pane_id = self.fresh_pane_id();
                }
            }
        }
        self.sessions.lock().insert(name.to_string(), windows);
    }

    /// Make every future call to `op` fail with CommandFailed
    pub fn fail_on(&self, op: &str) {
        self.fail_ops.lock().insert(op.to_string());
    }

    /// Make every future call to `op` block for `delay` before proceeding
    pub fn stall_on(&self, op: &str, delay: Duration) {
        self.stall_ops.lock().insert(op.to_string(), delay);
    }

    /// Number of structural mutations performed through the adapter
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Clone a session's windows for assertions
    pub fn windows_of(&self, name: &str) -> Option<Vec<FakeWindow>> {
        self.sessions.lock().get(name).cloned()
    }

    /// All live session names
    pub fn session_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn fresh_pane_id(&self) -> String {
        format!("%{}", self.next_pane_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check(&self, op: &str) -> AdapterResult<()> {
        let stall = self.stall_ops.lock().get(op).copied();
        if let Some(delay) = stall {
            std::thread::sleep(delay);
        }
        if self.fail_ops.lock().contains(op) {
            return Err(AdapterError::CommandFailed(format!("{} failed", op)));
        }
        Ok(())
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

impl MuxAdapter for FakeMux {
    fn list_sessions(&self) -> AdapterResult<Vec<String>> {
        self.check("list_sessions")?;
        Ok(self.session_names())
    }

    fn session_exists(&self, name: &str) -> AdapterResult<bool> {
        self.check("session_exists")?;
        Ok(self.sessions.lock().contains_key(name))
    }

    fn create_session(&self, name: &str, cwd: Option<&str>) -> AdapterResult<()> {
        self.check("create_session")?;
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(name) {
            return Err(AdapterError::AlreadyExists(name.to_string()));
        }
        let pane = FakePane {
            pane_id: self.fresh_pane_id(),
            current_path: cwd.map(|c| c.to_string()),
            current_command: Some("zsh".to_string()),
            active: true,
            ..Default::default()
        };
        sessions.insert(
            name.to_string(),
            vec![FakeWindow {
                name: "zsh".to_string(),
                layout: None,
                panes: vec![pane],
            }],
        );
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn kill_session(&self, name: &str) -> AdapterResult<()> {
        self.check("kill_session")?;
        if self.sessions.lock().remove(name).is_none() {
            return Err(AdapterError::NotFound(name.to_string()));
        }
        self.mutated();
        Ok(())
    }

    fn list_windows(&self, session: &str) -> AdapterResult<Vec<LiveWindow>> {
        self.check("list_windows")?;
        let sessions = self.sessions.lock();
        let windows = sessions
            .get(session)
            .ok_or_else(|| AdapterError::NotFound(session.to_string()))?;
        Ok(windows
            .iter()
            .enumerate()
            .map(|(i, w)| LiveWindow {
                index: i,
                name: w.name.clone(),
                layout: w.layout.clone(),
            })
            .collect())
    }

    fn list_panes(&self, session: &str, window_index: usize) -> AdapterResult<Vec<LivePane>> {
        self.check("list_panes")?;
        let sessions = self.sessions.lock();
        let windows = sessions
            .get(session)
            .ok_or_else(|| AdapterError::NotFound(session.to_string()))?;
        let window = windows
            .get(window_index)
            .ok_or_else(|| AdapterError::NotFound(format!("{}:{}", session, window_index)))?;
        Ok(window
            .panes
            .iter()
            .enumerate()
            .map(|(i, p)| LivePane {
                index: i,
                pane_id: p.pane_id.clone(),
                title: p.title.clone(),
                current_path: p.current_path.clone(),
                start_command: p.start_command.clone(),
                current_command: p.current_command.clone(),
                active: p.active,
            })
            .collect())
    }

    fn new_window(&self, session: &str, name: &str, cwd: Option<&str>) -> AdapterResult<usize> {
        self.check("new_window")?;
        let pane = FakePane {
            pane_id: self.fresh_pane_id(),
            current_path: cwd.map(|c| c.to_string()),
            current_command: Some("zsh".to_string()),
            active: true,
            ..Default::default()
        };
        let mut sessions = self.sessions.lock();
        let windows = sessions
            .get_mut(session)
            .ok_or_else(|| AdapterError::NotFound(session.to_string()))?;
        windows.push(FakeWindow {
            name: name.to_string(),
            layout: None,
            panes: vec![pane],
        });
        let index = windows.len() - 1;
        drop(sessions);
        self.mutated();
        Ok(index)
    }

    fn kill_window(&self, session: &str, window_index: usize) -> AdapterResult<()> {
        self.check("kill_window")?;
        let mut sessions = self.sessions.lock();
        let windows = sessions
            .get_mut(session)
            .ok_or_else(|| AdapterError::NotFound(session.to_string()))?;
        if window_index >= windows.len() {
            return Err(AdapterError::NotFound(format!(
                "{}:{}",
                session, window_index
            )));
        }
        windows.remove(window_index);
        // Killing the last window kills the session, as tmux does
        if windows.is_empty() {
            sessions.remove(session);
        }
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn rename_window(&self, session: &str, window_index: usize, name: &str) -> AdapterResult<()> {
        self.check("rename_window")?;
        let mut sessions = self.sessions.lock();
        let window = sessions
            .get_mut(session)
            .and_then(|ws| ws.get_mut(window_index))
            .ok_or_else(|| AdapterError::NotFound(format!("{}:{}", session, window_index)))?;
        window.name = name.to_string();
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn select_layout(&self, session: &str, window_index: usize, layout: &str) -> AdapterResult<()> {
        self.check("select_layout")?;
        let mut sessions = self.sessions.lock();
        let window = sessions
            .get_mut(session)
            .and_then(|ws| ws.get_mut(window_index))
            .ok_or_else(|| AdapterError::NotFound(format!("{}:{}", session, window_index)))?;
        window.layout = Some(layout.to_string());
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn split_pane(
        &self,
        session: &str,
        window_index: usize,
        cwd: Option<&str>,
    ) -> AdapterResult<usize> {
        self.check("split_pane")?;
        let pane = FakePane {
            pane_id: self.fresh_pane_id(),
            current_path: cwd.map(|c| c.to_string()),
            current_command: Some("zsh".to_string()),
            ..Default::default()
        };
        let mut sessions = self.sessions.lock();
        let window = sessions
            .get_mut(session)
            .and_then(|ws| ws.get_mut(window_index))
            .ok_or_else(|| AdapterError::NotFound(format!("{}:{}", session, window_index)))?;
        window.panes.push(pane);
        let index = window.panes.len() - 1;
        drop(sessions);
        self.mutated();
        Ok(index)
    }

    fn kill_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
    ) -> AdapterResult<()> {
        self.check("kill_pane")?;
        let mut sessions = self.sessions.lock();
        let window = sessions
            .get_mut(session)
            .and_then(|ws| ws.get_mut(window_index))
            .ok_or_else(|| AdapterError::NotFound(format!("{}:{}", session, window_index)))?;
        if pane_index >= window.panes.len() {
            return Err(AdapterError::NotFound(format!(
                "{}:{}.{}",
                session, window_index, pane_index
            )));
        }
        window.panes.remove(pane_index);
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn rename_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        title: &str,
    ) -> AdapterResult<()> {
        self.check("rename_pane")?;
        let mut sessions = self.sessions.lock();
        let pane = sessions
            .get_mut(session)
            .and_then(|ws| ws.get_mut(window_index))
            .and_then(|w| w.panes.get_mut(pane_index))
            .ok_or_else(|| {
                AdapterError::NotFound(format!("{}:{}.{}", session, window_index, pane_index))
            })?;
        pane.title = Some(title.to_string());
        drop(sessions);
        self.mutated();
        Ok(())
    }

    fn capture_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        max_lines: usize,
    ) -> AdapterResult<Vec<String>> {
        self.check("capture_pane")?;
        let sessions = self.sessions.lock();
        let pane = sessions
            .get(session)
            .and_then(|ws| ws.get(window_index))
            .and_then(|w| w.panes.get(pane_index))
            .ok_or_else(|| {
                AdapterError::NotFound(format!("{}:{}.{}", session, window_index, pane_index))
            })?;
        let start = pane.content.len().saturating_sub(max_lines);
        Ok(pane.content[start..].to_vec())
    }
}
