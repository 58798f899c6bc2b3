//! The provider-side handle routed and balanced by this crate.

use ferrox_core::Url;

/// One callable provider endpoint.
pub trait Invoker: std::fmt::Debug + Send + Sync {
    /// The provider's configuration url.
    fn url(&self) -> &Url;

    /// Whether the provider can currently serve calls.
    fn is_available(&self) -> bool {
        true
    }
}

/// An invoker backed by a fixed url, for registries fed from static
/// configuration and for tests.
#[derive(Debug, Clone)]
pub struct StaticInvoker {
    url: Url,
    available: bool,
}

impl StaticInvoker {
    /// An available invoker for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            available: true,
        }
    }

    /// Mark the invoker unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl Invoker for StaticInvoker {
    fn url(&self) -> &Url {
        &self.url
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_invoker_availability() {
        let url = Url::new().with_host("10.0.0.1");
        assert!(StaticInvoker::new(url.clone()).is_available());
        assert!(!StaticInvoker::new(url).unavailable().is_available());
    }
}
