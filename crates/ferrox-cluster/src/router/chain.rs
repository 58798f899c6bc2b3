//! The router pipeline.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use ferrox_core::{ExtensionRegistry, Invocation, Url};

use super::Router;
use crate::error::Result;
use crate::invoker::Invoker;

/// Ordered router pipeline over a candidate invoker list.
///
/// The resident routers come from the activated extensions of the
/// [`Router`](super::Router) contract and never change; rule-derived
/// routers can be swapped in with [`RouterChain::add_routers`]. Candidate
/// updates are push-based: [`RouterChain::set_invokers`] renotifies every
/// router whenever the upstream set changes.
pub struct RouterChain {
    invokers: RwLock<Vec<Arc<dyn Invoker>>>,
    routers: RwLock<Vec<Arc<dyn Router>>>,
    builtin: Vec<Arc<dyn Router>>,
}

impl RouterChain {
    /// Build a chain from the routers activated for `url`.
    pub fn build(registry: &ExtensionRegistry, url: &Url) -> Result<Self> {
        let loader = registry.loader::<dyn Router>()?;
        let builtin = loader.get_activated(url, &[], None)?;
        debug!(routers = builtin.len(), "built router chain");
        Ok(Self::with_routers(builtin))
    }

    /// Build a chain from an explicit resident router list.
    pub fn with_routers(builtin: Vec<Arc<dyn Router>>) -> Self {
        let mut routers = builtin.clone();
        routers.sort_by_key(|router| router.priority());
        Self {
            invokers: RwLock::new(Vec::new()),
            routers: RwLock::new(routers),
            builtin,
        }
    }

    /// Replace the rule-derived routers, keeping the resident ones.
    pub fn add_routers(&self, routers: Vec<Arc<dyn Router>>) {
        let mut combined = self.builtin.clone();
        combined.extend(routers);
        combined.sort_by_key(|router| router.priority());
        *self.routers.write() = combined;
    }

    /// Filter the current candidates through the pipeline, left to right.
    pub fn route(&self, url: &Url, invocation: &dyn Invocation) -> Result<Vec<Arc<dyn Invoker>>> {
        let mut candidates = self.invokers.read().clone();
        for router in self.routers.read().iter() {
            candidates = router.route(candidates, url, invocation)?;
        }
        Ok(candidates)
    }

    /// Install the candidate list and renotify every router.
    ///
    /// Called with the initial addresses and again on every upstream
    /// change.
    pub fn set_invokers(&self, invokers: Vec<Arc<dyn Invoker>>) {
        *self.invokers.write() = invokers.clone();
        for router in self.routers.read().iter() {
            router.notify(&invokers);
        }
    }

    /// Number of routers currently in the pipeline.
    pub fn len(&self) -> usize {
        self.routers.read().len()
    }

    /// Whether the pipeline has no routers.
    pub fn is_empty(&self) -> bool {
        self.routers.read().is_empty()
    }
}
