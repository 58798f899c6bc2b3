//! Error types for the cluster crate.

use ferrox_core::ExtensionError;

/// Cluster error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// No invoker was available to serve the call.
    #[error("No available invoker for {service}")]
    NoAvailableInvoker { service: String },

    /// A failure surfaced by the extension core.
    #[error(transparent)]
    Extension(#[from] ExtensionError),
}

/// Result type for cluster operations.
pub type Result<T> = std::result::Result<T, ClusterError>;
