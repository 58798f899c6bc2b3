//! Core traits and types for Ferrox.
//!
//! This crate defines the extension system that underlies every pluggable
//! behavior in the framework: load balancing, routing, thread dispatch,
//! codec selection. It provides:
//!
//! - [`Url`] - the URL-shaped configuration bag carried on every call
//! - [`Invocation`] - the per-call context (invoked method name)
//! - [`ExtensionRegistry`] - contract directory with one loader per contract
//! - [`ExtensionLoader`] - named-implementation cache with cyclic-safe wiring
//! - [`AdaptiveMethod`] - the per-call extension name resolution algorithm

pub mod extension;
pub mod invocation;
pub mod url;

pub use extension::adaptive::{AdaptiveMethod, AdaptiveMethods};
pub use extension::error::{BoxError, ExtensionError, Result};
pub use extension::loader::ExtensionLoader;
pub use extension::registry::ExtensionRegistry;
pub use extension::spec::{
    ActivateSpec, Constructed, ContractSpec, MethodSpec, ParamRole, ProviderSpec,
};
pub use invocation::{Invocation, RpcInvocation};
pub use url::Url;
