//! Error types for the extension system.

/// A boxed error type for user-supplied constructors and wire hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Extension system error taxonomy.
///
/// Every failure surfaces synchronously to the immediate caller; nothing is
/// retried inside the extension core. Retry policy, if any, belongs to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    /// The name is not present in the contract's provider table.
    #[error("No extension named `{name}` for contract {contract}")]
    UnknownExtension { contract: String, name: String },

    /// The contract declares no default implementation name.
    #[error("Contract {contract} declares no default extension")]
    NoDefaultDeclared { contract: String },

    /// The contract has no adaptive methods, so no dispatcher can exist.
    #[error("Contract {contract} has no adaptive methods")]
    NotAdaptive { contract: String },

    /// A non-adaptive method was invoked on the adaptive dispatcher.
    #[error("Method {method} of contract {contract} is not adaptive")]
    NotAdaptiveMethod { contract: String, method: String },

    /// A required configuration or call-context value was absent.
    #[error("Invalid argument: {message}")]
    ArgumentError { message: String },

    /// The resolution algorithm produced no extension name.
    #[error("Failed to resolve extension name for {contract} from url ({url}) using keys {keys:?}")]
    ResolutionFailed {
        contract: String,
        keys: Vec<String>,
        url: String,
    },

    /// An implementation's constructor or wire hook failed.
    #[error("Failed to construct extension `{name}` for contract {contract}: {reason}")]
    ConstructionFailed {
        contract: String,
        name: String,
        reason: String,
    },

    /// The contract type was never registered with the registry.
    #[error("Contract {contract} is not registered")]
    UnknownContract { contract: String },
}

impl ExtensionError {
    /// Shorthand for [`ExtensionError::ArgumentError`].
    pub fn argument(message: impl Into<String>) -> Self {
        ExtensionError::ArgumentError {
            message: message.into(),
        }
    }
}

/// Result type for extension operations.
pub type Result<T> = std::result::Result<T, ExtensionError>;
