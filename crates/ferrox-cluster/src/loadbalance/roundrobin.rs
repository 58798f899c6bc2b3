//! Rotating selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ferrox_core::{Invocation, Url};

use super::{available_invokers, LoadBalance};
use crate::error::{ClusterError, Result};
use crate::invoker::Invoker;

/// Rotates over the available invokers in arrival order.
#[derive(Debug, Default)]
pub struct RoundRobinLoadBalance {
    sequence: AtomicUsize,
}

impl RoundRobinLoadBalance {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalance for RoundRobinLoadBalance {
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
        let index = self.sequence.fetch_add(1, Ordering::Relaxed) % candidates.len();
        Ok(candidates[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::StaticInvoker;
    use ferrox_core::RpcInvocation;

    fn invoker(host: &str) -> Arc<dyn Invoker> {
        Arc::new(StaticInvoker::new(Url::new().with_host(host)))
    }

    #[test]
    fn test_rotates_in_order() {
        let invokers = vec![invoker("a"), invoker("b"), invoker("c")];
        let lb = RoundRobinLoadBalance::new();
        let invocation = RpcInvocation::new("call");

        for round in 0..2 {
            for expected in &invokers {
                let selected = lb.select(&invokers, &Url::new(), &invocation).unwrap();
                assert!(
                    Arc::ptr_eq(expected, &selected),
                    "round {round}: rotation out of order"
                );
            }
        }
    }

    #[test]
    fn test_rotation_skips_unavailable() {
        let up_one = invoker("one");
        let down: Arc<dyn Invoker> =
            Arc::new(StaticInvoker::new(Url::new().with_host("down")).unavailable());
        let up_two = invoker("two");
        let invokers = vec![up_one.clone(), down, up_two.clone()];

        let lb = RoundRobinLoadBalance::new();
        let invocation = RpcInvocation::new("call");

        let first = lb.select(&invokers, &Url::new(), &invocation).unwrap();
        let second = lb.select(&invokers, &Url::new(), &invocation).unwrap();
        assert!(Arc::ptr_eq(&first, &up_one));
        assert!(Arc::ptr_eq(&second, &up_two));
    }
}
