//! remux-utils: Common utilities for remux
//!
//! Shared infrastructure used across all remux crates: the unified error
//! type, logging setup, XDG path helpers, and session-name validation.

pub mod error;
pub mod logging;
pub mod names;
pub mod paths;

pub use error::{RemuxError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};
pub use names::validate_session_name;
