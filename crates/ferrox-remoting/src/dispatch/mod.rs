//! The thread-dispatch contract and its adaptive dispatcher.
//!
//! Unlike load balancing, dispatch selection carries no call context: the
//! strategy name comes straight from the server url, read from
//! `dispatcher` with the legacy `channel.handler` parameter as fallback.

mod buffered;
mod direct;

pub use buffered::BufferedDispatch;
pub use direct::DirectDispatch;

use std::sync::Arc;

use ferrox_core::{
    AdaptiveMethod, Constructed, ContractSpec, ExtensionLoader, ExtensionRegistry, MethodSpec,
    ParamRole, ProviderSpec, Url,
};

use crate::error::Result;
use crate::handler::ChannelHandler;

/// Url parameter selecting the dispatch strategy.
pub const DISPATCHER_KEY: &str = "dispatcher";

/// Legacy url parameter consulted when [`DISPATCHER_KEY`] is absent.
pub const LEGACY_DISPATCHER_KEY: &str = "channel.handler";

/// Decides where inbound events are processed.
pub trait Dispatch: Send + Sync {
    /// Wrap `handler` according to the strategy configured on `url`.
    fn dispatch(&self, handler: Arc<dyn ChannelHandler>, url: &Url)
        -> Result<Arc<dyn ChannelHandler>>;
}

/// The interpreted dispatcher for [`Dispatch`].
struct AdaptiveDispatch {
    loader: Arc<ExtensionLoader<dyn Dispatch>>,
    dispatch: Arc<AdaptiveMethod>,
}

impl Dispatch for AdaptiveDispatch {
    fn dispatch(
        &self,
        handler: Arc<dyn ChannelHandler>,
        url: &Url,
    ) -> Result<Arc<dyn ChannelHandler>> {
        let name = self.dispatch.resolve(url, None)?;
        let extension = self.loader.get(&name)?;
        extension.dispatch(handler, url)
    }
}

/// Register the [`Dispatch`] contract with its built-in strategies.
pub fn register_dispatch(
    registry: &ExtensionRegistry,
) -> ferrox_core::Result<Arc<ExtensionLoader<dyn Dispatch>>> {
    registry.register(
        ContractSpec::<dyn Dispatch>::new("Dispatch")
            .with_default("direct")
            .with_provider(ProviderSpec::new("direct", || {
                Ok(Constructed::new(Arc::new(DirectDispatch::new()) as Arc<dyn Dispatch>))
            }))
            .with_provider(ProviderSpec::new("buffered", || {
                Ok(Constructed::new(Arc::new(BufferedDispatch::new()) as Arc<dyn Dispatch>))
            }))
            .with_method(
                MethodSpec::adaptive("dispatch")
                    .with_keys([DISPATCHER_KEY, LEGACY_DISPATCHER_KEY])
                    .with_params([ParamRole::Other, ParamRole::Config]),
            )
            .with_adaptive(|methods, loader| {
                Ok(Arc::new(AdaptiveDispatch {
                    loader,
                    dispatch: methods.require("dispatch")?,
                }))
            }),
    )
}

/// Wrap `handler` with the dispatch strategy configured on `url`.
///
/// This is the transport's entry point: it asks the registry for the
/// adaptive [`Dispatch`] instance once per call and delegates to whichever
/// strategy the url selects.
pub fn wrap(
    registry: &ExtensionRegistry,
    handler: Arc<dyn ChannelHandler>,
    url: &Url,
) -> Result<Arc<dyn ChannelHandler>> {
    let dispatch = registry.get_adaptive_instance::<dyn Dispatch>()?;
    dispatch.dispatch(handler, url)
}
