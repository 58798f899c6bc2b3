//! Per-call context.
//!
//! An [`Invocation`] exposes the name of the method being invoked. The
//! adaptive resolver uses it for method-scoped configuration lookups
//! (`{method}.{key}` parameters on the [`Url`](crate::Url)).

/// The per-call context seen by adaptive dispatch.
pub trait Invocation: Send + Sync {
    /// The name of the method being invoked.
    fn method_name(&self) -> &str;
}

/// Standard value implementation of [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcInvocation {
    method_name: String,
}

impl RpcInvocation {
    /// Create an invocation for the given method name.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
        }
    }
}

impl Invocation for RpcInvocation {
    fn method_name(&self) -> &str {
        &self.method_name
    }
}
