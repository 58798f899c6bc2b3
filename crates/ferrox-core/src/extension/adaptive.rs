//! Per-call resolution of the implementation name.
//!
//! The original design synthesized one dispatcher class per contract from
//! its method signatures. Here the same behavior is an interpreted
//! algorithm: an [`AdaptiveMethod`] captures a method's selection keys,
//! configuration source and call-context presence once, at dispatcher
//! construction, and [`AdaptiveMethod::resolve`] executes the lookup chain
//! on every call.

use std::sync::Arc;

use tracing::trace;

use super::error::{ExtensionError, Result};
use super::spec::{camel_to_split_name, MethodSpec, ParamRole};
use crate::invocation::Invocation;
use crate::url::Url;

/// Selection key that reads the url scheme instead of a parameter.
const PROTOCOL_KEY: &str = "protocol";

/// Where an adaptive method's configuration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    /// A parameter is the [`Url`] itself.
    Direct,
    /// A parameter exposes the [`Url`] through an accessor evaluated at
    /// call time.
    Accessor,
}

/// Validated resolver for one adaptive method.
///
/// Holds everything resolution needs: the ordered selection-key list (the
/// derived key when none was declared), the contract's default name, and
/// the parameter roles relevant to resolution.
#[derive(Debug, Clone)]
pub struct AdaptiveMethod {
    contract: String,
    method: String,
    keys: Vec<String>,
    default_name: Option<String>,
    config_source: ConfigSource,
    has_invocation: bool,
}

impl AdaptiveMethod {
    fn from_method(
        contract: &str,
        default_name: Option<&str>,
        method: &MethodSpec,
    ) -> Result<Self> {
        let config_source = if method.params().contains(&ParamRole::Config) {
            ConfigSource::Direct
        } else if method.params().contains(&ParamRole::ConfigSource) {
            ConfigSource::Accessor
        } else {
            // Definition-time error: without a configuration parameter the
            // dispatcher for this method can never resolve anything.
            return Err(ExtensionError::argument(format!(
                "no configuration parameter in adaptive method {} of contract {}",
                method.name(),
                contract
            )));
        };

        let keys = if method.keys().is_empty() {
            vec![camel_to_split_name(contract, '.')]
        } else {
            method.keys().to_vec()
        };

        Ok(Self {
            contract: contract.to_string(),
            method: method.name().to_string(),
            keys,
            default_name: default_name.map(str::to_string),
            config_source,
            has_invocation: method.params().contains(&ParamRole::Invocation),
        })
    }

    /// The contract name.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The effective selection keys (never empty).
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether the configuration arrives through an accessor parameter.
    pub fn config_via_accessor(&self) -> bool {
        self.config_source == ConfigSource::Accessor
    }

    /// Whether a call-context parameter is declared.
    pub fn has_invocation(&self) -> bool {
        self.has_invocation
    }

    /// Check an accessor-produced configuration, as the original's
    /// generated null checks did.
    pub fn config_from<'a>(&self, exposed: Option<&'a Url>) -> Result<&'a Url> {
        exposed.ok_or_else(|| {
            ExtensionError::argument(format!(
                "missing configuration for method {} of contract {}",
                self.method, self.contract
            ))
        })
    }

    /// Compute the extension name for one call.
    ///
    /// The key list `[k_0 .. k_n]` combines right to left: the value of
    /// `k_i` falls back to the value computed for `k_{i+1}`, and the
    /// rightmost key falls back to the contract's default name. The
    /// reserved key `protocol` reads the url scheme; every other key reads
    /// a parameter, method-scoped when a call context is present and
    /// global otherwise.
    pub fn resolve(&self, url: &Url, invocation: Option<&dyn Invocation>) -> Result<String> {
        let method_name = invocation.map(|inv| inv.method_name());

        let mut candidate: Option<String> = self.default_name.clone();
        for key in self.keys.iter().rev() {
            candidate = if key == PROTOCOL_KEY {
                url.scheme().map(str::to_string).or(candidate)
            } else if let Some(method) = method_name {
                url.method_param(method, key).map(str::to_string).or(candidate)
            } else {
                url.param(key).map(str::to_string).or(candidate)
            };
        }

        match candidate {
            Some(name) if !name.is_empty() => {
                trace!(
                    contract = %self.contract,
                    method = %self.method,
                    extension = %name,
                    "resolved adaptive extension"
                );
                Ok(name)
            }
            _ => Err(ExtensionError::ResolutionFailed {
                contract: self.contract.clone(),
                keys: self.keys.clone(),
                url: url.to_string(),
            }),
        }
    }
}

/// The validated adaptive-method set of one contract.
///
/// Built once when the adaptive dispatcher is constructed and handed to
/// the contract's adaptive factory.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveMethods {
    methods: Vec<Arc<AdaptiveMethod>>,
}

impl AdaptiveMethods {
    pub(crate) fn from_methods(
        contract: &str,
        default_name: Option<&str>,
        methods: &[MethodSpec],
    ) -> Result<Self> {
        let methods = methods
            .iter()
            .filter(|m| m.is_adaptive())
            .map(|m| AdaptiveMethod::from_method(contract, default_name, m).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { methods })
    }

    /// The resolver for `method`, if that method is adaptive.
    pub fn get(&self, method: &str) -> Option<Arc<AdaptiveMethod>> {
        self.methods.iter().find(|m| m.method() == method).cloned()
    }

    /// The resolver for `method`, failing when the method is unknown or
    /// not adaptive.
    pub fn require(&self, method: &str) -> Result<Arc<AdaptiveMethod>> {
        self.get(method).ok_or_else(|| {
            ExtensionError::argument(format!("no adaptive method named {}", method))
        })
    }

    /// Number of adaptive methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the contract has no adaptive methods.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::RpcInvocation;

    fn resolver(keys: &[&str], default_name: Option<&str>) -> AdaptiveMethod {
        let method = MethodSpec::adaptive("select")
            .with_keys(keys.iter().copied())
            .with_params([ParamRole::Config, ParamRole::Invocation]);
        AdaptiveMethod::from_method("LoadBalance", default_name, &method).unwrap()
    }

    #[test]
    fn test_single_key_with_default() {
        let method = resolver(&["loadbalance"], Some("random"));

        let url = Url::new();
        assert_eq!(method.resolve(&url, None).unwrap(), "random");

        let url = Url::new().with_param("loadbalance", "roundrobin");
        assert_eq!(method.resolve(&url, None).unwrap(), "roundrobin");
    }

    #[test]
    fn test_right_to_left_fallback() {
        let method = resolver(&["a", "b"], Some("D"));

        // Only the rightmost key set: its value wins.
        let url = Url::new().with_param("b", "V");
        assert_eq!(method.resolve(&url, None).unwrap(), "V");

        // The leftmost key overrides the chain.
        let url = Url::new().with_param("a", "W").with_param("b", "V");
        assert_eq!(method.resolve(&url, None).unwrap(), "W");

        // Nothing set: the declared default survives the whole chain.
        let url = Url::new();
        assert_eq!(method.resolve(&url, None).unwrap(), "D");
    }

    #[test]
    fn test_protocol_key_reads_scheme() {
        let method = resolver(&["protocol"], Some("fallback"));

        let url = Url::new().with_scheme("ferrox");
        assert_eq!(method.resolve(&url, None).unwrap(), "ferrox");

        // Scheme ignores keyed parameters entirely.
        let url = Url::new().with_scheme("ferrox").with_param("protocol", "other");
        assert_eq!(method.resolve(&url, None).unwrap(), "ferrox");

        let url = Url::new();
        assert_eq!(method.resolve(&url, None).unwrap(), "fallback");
    }

    #[test]
    fn test_method_scoped_lookup() {
        let method = resolver(&["loadbalance"], Some("random"));
        let url = Url::new()
            .with_param("loadbalance", "random")
            .with_method_param("sayHello", "loadbalance", "roundrobin");

        let say_hello = RpcInvocation::new("sayHello");
        assert_eq!(method.resolve(&url, Some(&say_hello)).unwrap(), "roundrobin");

        let other = RpcInvocation::new("other");
        assert_eq!(method.resolve(&url, Some(&other)).unwrap(), "random");
    }

    #[test]
    fn test_empty_resolution_fails() {
        let method = resolver(&["x"], None);
        let url = Url::new().with_param("unrelated", "1");

        let err = method.resolve(&url, None).unwrap_err();
        match err {
            ExtensionError::ResolutionFailed { contract, keys, .. } => {
                assert_eq!(contract, "LoadBalance");
                assert_eq!(keys, vec!["x".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_derived_key_when_none_declared() {
        let method = MethodSpec::adaptive("select").with_params([ParamRole::Config]);
        let resolver = AdaptiveMethod::from_method("LoadBalance", None, &method).unwrap();

        assert_eq!(resolver.keys(), ["load.balance"]);

        let url = Url::new().with_param("load.balance", "sticky");
        assert_eq!(resolver.resolve(&url, None).unwrap(), "sticky");
    }

    #[test]
    fn test_missing_config_param_is_definition_error() {
        let method = MethodSpec::adaptive("select").with_params([ParamRole::Other]);
        let result = AdaptiveMethod::from_method("LoadBalance", None, &method);
        assert!(matches!(result, Err(ExtensionError::ArgumentError { .. })));
    }

    #[test]
    fn test_accessor_config_null_check() {
        let method = MethodSpec::adaptive("refer")
            .with_params([ParamRole::ConfigSource]);
        let resolver = AdaptiveMethod::from_method("Protocol", None, &method).unwrap();
        assert!(resolver.config_via_accessor());

        let url = Url::new().with_scheme("ferrox");
        assert!(resolver.config_from(Some(&url)).is_ok());
        assert!(matches!(
            resolver.config_from(None),
            Err(ExtensionError::ArgumentError { .. })
        ));
    }
}
