//! Session capture
//!
//! Walks a live session through the adapter and turns it into the
//! window/pane records a snapshot stores. Structure enumeration must
//! succeed; per-pane scrollback capture is best-effort and a pane whose
//! text cannot be read is still recorded, just without content.

use std::sync::Arc;

use tracing::{debug, warn};

use remux_protocol::{PaneRecord, WindowRecord};
use remux_utils::{RemuxError, Result};

use crate::adapter::MuxAdapter;
use crate::scrollback::ScrollbackCodec;

/// Captures live session topology and scrollback
pub struct SessionCapturer {
    adapter: Arc<dyn MuxAdapter>,
    codec: ScrollbackCodec,
    tail_preview_lines: usize,
    capture_lines: usize,
}

impl SessionCapturer {
    /// Create a capturer reading at most `capture_lines` of scrollback per
    /// pane and keeping `tail_preview_lines` of it as the plain-text preview
    pub fn new(adapter: Arc<dyn MuxAdapter>, capture_lines: usize, tail_preview_lines: usize) -> Self {
        Self {
            adapter,
            codec: ScrollbackCodec::new(capture_lines),
            tail_preview_lines,
            capture_lines,
        }
    }

    /// Capture the full window/pane topology of a live session
    pub fn capture(&self, session_name: &str) -> Result<Vec<WindowRecord>> {
        let windows = self
            .adapter
            .list_windows(session_name)
            .map_err(RemuxError::from)?;

        let mut records = Vec::with_capacity(windows.len());
        for window in windows {
            let panes = self
                .adapter
                .list_panes(session_name, window.index)
                .map_err(RemuxError::from)?;

            let mut pane_records = Vec::with_capacity(panes.len());
            for pane in panes {
                let lines = match self.adapter.capture_pane(
                    session_name,
                    window.index,
                    pane.index,
                    self.capture_lines,
                ) {
                    Ok(lines) => lines,
                    Err(e) => {
                        warn!(
                            "Failed to capture pane {}:{}.{}: {}",
                            session_name, window.index, pane.index, e
                        );
                        Vec::new()
                    }
                };

                let scrollback = if lines.is_empty() {
                    None
                } else {
                    Some(self.codec.encode(&lines))
                };

                pane_records.push(PaneRecord {
                    index: pane.index,
                    pane_id: pane.pane_id,
                    title: pane.title,
                    current_path: pane.current_path,
                    start_command: pane.start_command,
                    current_command: pane.current_command,
                    tail_preview: ScrollbackCodec::tail_preview(&lines, self.tail_preview_lines),
                    active: pane.active,
                    scrollback,
                });
            }

            records.push(WindowRecord {
                index: window.index,
                name: window.name,
                layout: window.layout,
                panes: pane_records,
            });
        }

        debug!(
            "Captured session '{}': {} window(s)",
            session_name,
            records.len()
        );

        Ok(records)
    }
}
