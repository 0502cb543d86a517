//! Session name validation
//!
//! Restore targets arrive from untrusted input and end up interpolated into
//! multiplexer commands, so names are validated at the boundary before any
//! job is created.

use crate::{RemuxError, Result};

/// Maximum accepted session name length
const MAX_NAME_LEN: usize = 100;

/// Validate a session name for use as a restore target.
///
/// Multiplexer target syntax reserves `:` (window separator) and `.`
/// (pane separator); whitespace and control characters are rejected
/// outright.
pub fn validate_session_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RemuxError::invalid_argument("session name is empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(RemuxError::invalid_argument(format!(
            "session name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }

    for ch in name.chars() {
        if ch == ':' || ch == '.' {
            return Err(RemuxError::invalid_argument(format!(
                "session name contains reserved character '{}'",
                ch
            )));
        }
        if ch.is_whitespace() || ch.is_control() {
            return Err(RemuxError::invalid_argument(
                "session name contains whitespace or control characters",
            ));
        }
    }

    Ok(())
}
