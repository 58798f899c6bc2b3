//! Uniform random selection.

use std::sync::Arc;

use rand::Rng;

use ferrox_core::{Invocation, Url};

use super::{available_invokers, LoadBalance};
use crate::error::{ClusterError, Result};
use crate::invoker::Invoker;

/// Picks an available invoker uniformly at random.
#[derive(Debug, Default)]
pub struct RandomLoadBalance;

impl RandomLoadBalance {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalance for RandomLoadBalance {
    fn select(
        &self,
        invokers: &[Arc<dyn Invoker>],
        url: &Url,
        _invocation: &dyn Invocation,
    ) -> Result<Arc<dyn Invoker>> {
        let candidates = available_invokers(invokers);
        if candidates.is_empty() {
            return Err(ClusterError::NoAvailableInvoker {
                service: url.path().unwrap_or_default().to_string(),
            });
        }
        let index = rand::thread_rng().gen_range(0..candidates.len());
        Ok(candidates[index].clone())
    }
}
