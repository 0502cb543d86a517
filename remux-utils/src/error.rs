//! Error types for remux
//!
//! Provides a unified error type used across all remux crates.

use std::path::PathBuf;

/// Main error type for remux operations
#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Lookup Errors ===

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(u64),

    #[error("Recovery job not found: {0}")]
    JobNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionExists(String),

    // === Validation Errors ===

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // === Replay Errors ===

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Availability Errors ===

    #[error("Recovery unavailable: {0}")]
    Unavailable(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    // === Persistence Errors ===

    #[error("Persistence error: {0}")]
    Persistence(String),

    // === Adapter Errors ===

    #[error("Adapter error: {0}")]
    Adapter(String),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RemuxError {
    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create an adapter error
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error represents a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SnapshotNotFound(_) | Self::JobNotFound(_) | Self::SessionNotFound(_)
        )
    }

    /// Check if this error is a replay conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Result type alias using RemuxError
pub type Result<T> = std::result::Result<T, RemuxError>;
