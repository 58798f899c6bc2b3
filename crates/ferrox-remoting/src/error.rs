//! Error types for the remoting crate.

use ferrox_core::ExtensionError;

/// Remoting error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemotingError {
    /// A handler failed to process an inbound message.
    #[error("Failed to handle message: {0}")]
    Handler(String),

    /// A failure surfaced by the extension core.
    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

/// Result type for remoting operations.
pub type Result<T> = std::result::Result<T, RemotingError>;
