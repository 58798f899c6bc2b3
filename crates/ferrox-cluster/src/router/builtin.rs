//! Built-in routers.

use std::sync::Arc;

use ferrox_core::{Invocation, Url};

use super::Router;
use crate::error::Result;
use crate::invoker::Invoker;

/// Drops invokers that report themselves unavailable.
#[derive(Debug, Default)]
pub struct AvailabilityRouter;

impl AvailabilityRouter {
    pub fn new() -> Self {
        Self
    }
}

impl Router for AvailabilityRouter {
    fn route(
        &self,
        invokers: Vec<Arc<dyn Invoker>>,
        _url: &Url,
        _invocation: &dyn Invocation,
    ) -> Result<Vec<Arc<dyn Invoker>>> {
        Ok(invokers
            .into_iter()
            .filter(|invoker| invoker.is_available())
            .collect())
    }

    fn priority(&self) -> i32 {
        -100
    }
}

/// Keeps providers whose tag matches the consumer's requested tag.
///
/// With no requested tag the router passes everything through; a requested
/// tag keeps only providers carrying the same `tag` parameter.
#[derive(Debug, Default)]
pub struct TagRouter;

impl TagRouter {
    /// Url parameter naming the requested tag.
    pub const TAG_KEY: &'static str = "tag";

    pub fn new() -> Self {
        Self
    }
}

impl Router for TagRouter {
    fn route(
        &self,
        invokers: Vec<Arc<dyn Invoker>>,
        url: &Url,
        _invocation: &dyn Invocation,
    ) -> Result<Vec<Arc<dyn Invoker>>> {
        let Some(tag) = url.param(Self::TAG_KEY) else {
            return Ok(invokers);
        };
        let tag = tag.to_string();
        Ok(invokers
            .into_iter()
            .filter(|invoker| invoker.url().param(Self::TAG_KEY) == Some(tag.as_str()))
            .collect())
    }
}
