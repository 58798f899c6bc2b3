//! The pluggable extension system.
//!
//! Every pluggable behavior in the framework (load balancing, routing,
//! thread dispatch, codec selection) is an *extensibility contract*: an
//! object-safe trait with named implementations. This module provides:
//!
//! - [`spec`] - contract metadata: providers, methods, activation conditions
//! - [`loader`] - per-contract instance cache with cyclic-safe wiring
//! - [`registry`] - the directory mapping contract types to loaders
//! - [`adaptive`] - per-call resolution of the implementation name
//! - [`error`] - the extension error taxonomy

pub mod adaptive;
pub mod error;
pub mod loader;
pub mod registry;
pub mod spec;

pub use adaptive::{AdaptiveMethod, AdaptiveMethods};
pub use error::{BoxError, ExtensionError, Result};
pub use loader::ExtensionLoader;
pub use registry::ExtensionRegistry;
pub use spec::{ActivateSpec, Constructed, ContractSpec, MethodSpec, ParamRole, ProviderSpec};
