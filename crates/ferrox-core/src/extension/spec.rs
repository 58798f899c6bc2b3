//! Contract metadata: providers, method descriptors, activation conditions.
//!
//! A [`ContractSpec`] is the registry-facing description of one
//! extensibility contract. It replaces runtime reflection with an explicit
//! metadata structure captured once, when the contract is registered:
//! which named implementations exist and how to construct them, which
//! methods are adaptive and under which selection keys, and which
//! implementations activate automatically for pipeline-style consumers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::adaptive::AdaptiveMethods;
use super::error::BoxError;
use super::loader::ExtensionLoader;
use super::registry::ExtensionRegistry;
use crate::url::Url;

/// Reserved pseudo-name under which the adaptive dispatcher is cached.
///
/// Providers may not register this name.
pub const ADAPTIVE_NAME: &str = "$adaptive";

/// Convert a camel-cased name to a separator-joined lowercase key.
///
/// Walks the characters once: an ASCII uppercase character is lowercased
/// and, when not at index 0, preceded by `separator`; every other character
/// passes through unchanged. `LoadBalance` becomes `load.balance`,
/// `Dispatch` becomes `dispatch`, `ABTest` becomes `a.b.test`.
pub fn camel_to_split_name(name: &str, separator: char) -> String {
    let mut result = String::with_capacity(name.len() + 2);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                result.push(separator);
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Role of one parameter of a contract method.
///
/// Captured per method so the adaptive dispatcher knows, without
/// reflection, where the configuration and call context come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// The parameter is the configuration [`Url`] itself.
    Config,
    /// The parameter exposes a configuration via a zero-argument accessor
    /// that may yield nothing at call time.
    ConfigSource,
    /// The parameter is the per-call context (exposes the method name).
    Invocation,
    /// The parameter plays no role in resolution.
    Other,
}

/// Descriptor of one contract method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    name: String,
    adaptive: bool,
    keys: Vec<String>,
    params: Vec<ParamRole>,
}

impl MethodSpec {
    /// Describe an adaptive method.
    pub fn adaptive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adaptive: true,
            keys: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Describe a non-adaptive method.
    ///
    /// Invoking it on the adaptive dispatcher always fails.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adaptive: false,
            keys: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Set the ordered selection-key list.
    ///
    /// When left empty, a single key derived from the contract name with
    /// [`camel_to_split_name`] is used.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the parameter roles, in declared order.
    pub fn with_params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = ParamRole>,
    {
        self.params = params.into_iter().collect();
        self
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the method is adaptive.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// The declared selection keys (possibly empty).
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The declared parameter roles.
    pub fn params(&self) -> &[ParamRole] {
        &self.params
    }
}

/// Activation condition and ordering for one implementation.
///
/// Used by [`ExtensionLoader::get_activated`] to assemble pipeline-style
/// consumers (e.g. the router chain).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateSpec {
    groups: Vec<String>,
    keys: Vec<String>,
    order: i32,
}

impl ActivateSpec {
    /// An activation condition with no groups, no keys, order 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group this implementation belongs to.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Add a parameter key whose presence activates this implementation.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Set the activation order (lower sorts first).
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// The activation order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Whether this implementation belongs to the requested group.
    ///
    /// No requested group matches everything; a requested group matches
    /// only implementations that declared it.
    pub fn matches_group(&self, group: Option<&str>) -> bool {
        match group {
            None => true,
            Some(group) => self.groups.iter().any(|g| g == group),
        }
    }

    /// Whether the activation condition holds for `url`.
    ///
    /// With no declared keys the condition always holds. Otherwise at least
    /// one declared key must appear among the url's parameters (as the
    /// exact parameter name or as a `.key` suffix) with a non-empty value.
    pub fn is_active(&self, url: &Url) -> bool {
        if self.keys.is_empty() {
            return true;
        }
        url.parameters().iter().any(|(param, value)| {
            !value.is_empty()
                && self
                    .keys
                    .iter()
                    .any(|key| param == key || param.ends_with(&format!(".{}", key)))
        })
    }
}

/// A freshly constructed, not yet wired instance.
///
/// Returned by provider constructors. The optional wire hook runs after the
/// instance is published into the loader's cache, so dependencies that
/// cycle back to this instance resolve to it instead of recursing.
pub struct Constructed<C: ?Sized> {
    pub(crate) instance: Arc<C>,
    pub(crate) wire: Option<WireFn>,
}

/// Setter-style wiring hook, run once after construction.
pub type WireFn =
    Box<dyn FnOnce(&ExtensionRegistry) -> std::result::Result<(), BoxError> + Send>;

impl<C: ?Sized> Constructed<C> {
    /// A constructed instance with no dependencies to wire.
    pub fn new(instance: Arc<C>) -> Self {
        Self {
            instance,
            wire: None,
        }
    }

    /// Attach the wire hook that resolves this instance's dependencies.
    pub fn with_wire<F>(mut self, wire: F) -> Self
    where
        F: FnOnce(&ExtensionRegistry) -> std::result::Result<(), BoxError> + Send + 'static,
    {
        self.wire = Some(Box::new(wire));
        self
    }
}

type ConstructFn<C> =
    Box<dyn Fn() -> std::result::Result<Constructed<C>, BoxError> + Send + Sync>;

/// One named implementation of a contract.
pub struct ProviderSpec<C: ?Sized> {
    name: String,
    construct: ConstructFn<C>,
    activate: Option<ActivateSpec>,
}

impl<C: ?Sized> ProviderSpec<C> {
    /// Declare an implementation under `name` with its constructor.
    pub fn new<F>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn() -> std::result::Result<Constructed<C>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            construct: Box::new(construct),
            activate: None,
        }
    }

    /// Declare the activation condition for [`ExtensionLoader::get_activated`].
    pub fn with_activate(mut self, activate: ActivateSpec) -> Self {
        self.activate = Some(activate);
        self
    }

    /// The implementation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The activation condition, if declared.
    pub fn activate(&self) -> Option<&ActivateSpec> {
        self.activate.as_ref()
    }

    pub(crate) fn construct(&self) -> std::result::Result<Constructed<C>, BoxError> {
        (self.construct)()
    }
}

type AdaptiveFactory<C> = Box<
    dyn Fn(AdaptiveMethods, Arc<ExtensionLoader<C>>) -> std::result::Result<Arc<C>, BoxError>
        + Send
        + Sync,
>;

/// Registry-facing description of one extensibility contract.
pub struct ContractSpec<C: ?Sized + Send + Sync + 'static> {
    name: String,
    default_name: Option<String>,
    providers: Vec<ProviderSpec<C>>,
    methods: Vec<MethodSpec>,
    adaptive_factory: Option<AdaptiveFactory<C>>,
}

impl<C: ?Sized + Send + Sync + 'static> ContractSpec<C> {
    /// Start describing a contract. `name` identifies it in diagnostics and
    /// seeds the derived selection key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_name: None,
            providers: Vec::new(),
            methods: Vec::new(),
            adaptive_factory: None,
        }
    }

    /// Declare the default implementation name.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    /// Add a named implementation. Declaration order is the tie-breaker for
    /// activation ordering.
    pub fn with_provider(mut self, provider: ProviderSpec<C>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add a method descriptor.
    pub fn with_method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Install the adaptive dispatcher factory.
    ///
    /// The factory receives the validated per-method resolvers and the
    /// contract's loader, and returns the dispatcher instance.
    pub fn with_adaptive<F>(mut self, factory: F) -> Self
    where
        F: Fn(AdaptiveMethods, Arc<ExtensionLoader<C>>) -> std::result::Result<Arc<C>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.adaptive_factory = Some(Box::new(factory));
        self
    }

    /// The contract name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared default implementation name, if any.
    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// All declared implementation names, in declaration order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// The method descriptors.
    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    pub(crate) fn providers(&self) -> &[ProviderSpec<C>] {
        &self.providers
    }

    pub(crate) fn find_provider(&self, name: &str) -> Option<&ProviderSpec<C>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub(crate) fn adaptive_factory(&self) -> Option<&AdaptiveFactory<C>> {
        self.adaptive_factory.as_ref()
    }

    /// Reject malformed provider tables at registration time.
    pub(crate) fn validate(&self) -> super::error::Result<()> {
        use super::error::ExtensionError;

        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name().is_empty() {
                return Err(ExtensionError::argument(format!(
                    "empty extension name in contract {}",
                    self.name
                )));
            }
            if provider.name() == ADAPTIVE_NAME {
                return Err(ExtensionError::argument(format!(
                    "extension name `{}` is reserved (contract {})",
                    ADAPTIVE_NAME, self.name
                )));
            }
            if self.providers[..i].iter().any(|p| p.name() == provider.name()) {
                return Err(ExtensionError::argument(format!(
                    "duplicate extension name `{}` in contract {}",
                    provider.name(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}
