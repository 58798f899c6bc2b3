//! The load-balance contract and its adaptive dispatcher.
//!
//! `LoadBalance` is the canonical adaptive contract: the strategy is picked
//! per call from the `loadbalance` parameter (method-scoped first), falling
//! back to the contract default `random`.

mod random;
mod roundrobin;

pub use random::RandomLoadBalance;
pub use roundrobin::RoundRobinLoadBalance;

use std::sync::Arc;

use ferrox_core::{
    AdaptiveMethod, Constructed, ContractSpec, ExtensionLoader, ExtensionRegistry, Invocation,
    MethodSpec, ParamRole, ProviderSpec, Url,
};

use crate::error::Result;
use crate::invoker::Invoker;

/// Url parameter selecting the load-balance strategy.
pub const LOAD_BALANCE_KEY: &str = "loadbalance";

/// Picks one invoker out of the routed candidate list.
pub trait LoadBalance: Send + Sync {
    /// Select an invoker for this call.
    fn select(
        &self,
        invokers: &[Arc<dyn Invoker>],
        url: &Url,
        invocation: &dyn Invocation,
    ) -> Result<Arc<dyn Invoker>>;
}

/// The interpreted dispatcher for [`LoadBalance`].
///
/// Resolves the strategy name from the call's url and invocation, then
/// delegates `select` to that strategy with the arguments unchanged.
struct AdaptiveLoadBalance {
    loader: Arc<ExtensionLoader<dyn LoadBalance>>,
    select: Arc<AdaptiveMethod>,
}

impl LoadBalance for AdaptiveLoadBalance {
    fn select(
        &self,
        invokers: &[Arc<dyn Invoker>],
        url: &Url,
        invocation: &dyn Invocation,
    ) -> Result<Arc<dyn Invoker>> {
        let name = self.select.resolve(url, Some(invocation))?;
        let extension = self.loader.get(&name)?;
        extension.select(invokers, url, invocation)
    }
}

/// Register the [`LoadBalance`] contract with its built-in strategies.
pub fn register_load_balance(
    registry: &ExtensionRegistry,
) -> ferrox_core::Result<Arc<ExtensionLoader<dyn LoadBalance>>> {
    registry.register(
        ContractSpec::<dyn LoadBalance>::new("LoadBalance")
            .with_default("random")
            .with_provider(ProviderSpec::new("random", || {
                Ok(Constructed::new(Arc::new(RandomLoadBalance::new()) as Arc<dyn LoadBalance>))
            }))
            .with_provider(ProviderSpec::new("roundrobin", || {
                Ok(Constructed::new(Arc::new(RoundRobinLoadBalance::new()) as Arc<dyn LoadBalance>))
            }))
            .with_method(
                MethodSpec::adaptive("select")
                    .with_keys([LOAD_BALANCE_KEY])
                    .with_params([ParamRole::Other, ParamRole::Config, ParamRole::Invocation]),
            )
            .with_adaptive(|methods, loader| {
                Ok(Arc::new(AdaptiveLoadBalance {
                    loader,
                    select: methods.require("select")?,
                }))
            }),
    )
}

/// Keep the candidates that can actually serve the call.
pub(crate) fn available_invokers(invokers: &[Arc<dyn Invoker>]) -> Vec<Arc<dyn Invoker>> {
    invokers
        .iter()
        .filter(|invoker| invoker.is_available())
        .cloned()
        .collect()
}
