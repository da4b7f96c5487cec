//! Error types for the Keygate daemon

use thiserror::Error;

/// Result type alias for daemon operations
pub type Result<T> = std::result::Result<T, DaemonError>;

/// Errors that can occur in the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Protocol error reported by the gate
    #[error("Core error: {0}")]
    Core(#[from] keygate_core::Error),

    /// State storage error
    #[error("Storage error: {0}")]
    Storage(#[from] keygate_ledger::StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signer backend failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// The outbox subscription was closed
    #[error("Event channel closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for DaemonError {
    fn from(e: serde_json::Error) -> Self {
        DaemonError::Serialization(e.to_string())
    }
}
