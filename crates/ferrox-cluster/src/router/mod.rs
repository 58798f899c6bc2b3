//! The routing contract and its pipeline.
//!
//! Routers are pipeline extensions: [`RouterChain`] collects every
//! activated router for a consumer url and filters the candidate invoker
//! list through them, left to right, on every call.

mod builtin;
mod chain;

pub use builtin::{AvailabilityRouter, TagRouter};
pub use chain::RouterChain;

use std::sync::Arc;

use ferrox_core::{
    ActivateSpec, Constructed, ContractSpec, ExtensionLoader, ExtensionRegistry, Invocation,
    ProviderSpec, Url,
};

use crate::error::Result;
use crate::invoker::Invoker;

/// Filters the candidate invoker list for one call.
pub trait Router: Send + Sync {
    /// Keep the candidates this router lets through.
    fn route(
        &self,
        invokers: Vec<Arc<dyn Invoker>>,
        url: &Url,
        invocation: &dyn Invocation,
    ) -> Result<Vec<Arc<dyn Invoker>>>;

    /// Called whenever the upstream candidate set changes.
    fn notify(&self, _invokers: &[Arc<dyn Invoker>]) {}

    /// Position in the chain; lower runs earlier.
    fn priority(&self) -> i32 {
        0
    }
}

/// Register the [`Router`] contract with its built-in routers.
pub fn register_routers(
    registry: &ExtensionRegistry,
) -> ferrox_core::Result<Arc<ExtensionLoader<dyn Router>>> {
    registry.register(
        ContractSpec::<dyn Router>::new("Router")
            .with_provider(
                ProviderSpec::new("available", || {
                    Ok(Constructed::new(Arc::new(AvailabilityRouter::new()) as Arc<dyn Router>))
                })
                .with_activate(ActivateSpec::new().with_order(-100)),
            )
            .with_provider(
                ProviderSpec::new("tag", || Ok(Constructed::new(Arc::new(TagRouter::new()) as Arc<dyn Router>)))
                    // Joins the chain only when the consumer url carries a
                    // tag parameter.
                    .with_activate(ActivateSpec::new().with_key(TagRouter::TAG_KEY)),
            ),
    )
}
