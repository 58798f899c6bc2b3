//! Tests for the adaptive dispatcher: construction, per-call resolution,
//! delegation, and the failure taxonomy around it.

use std::sync::Arc;

use ferrox_core::{
    AdaptiveMethod, Constructed, ContractSpec, ExtensionError, ExtensionLoader,
    ExtensionRegistry, Invocation, MethodSpec, ParamRole, ProviderSpec, RpcInvocation, Url,
};

/// A contract with one adaptive and one non-adaptive method.
trait Greeting: std::fmt::Debug + Send + Sync {
    fn say_hello(&self, url: &Url, invocation: &dyn Invocation) -> Result<String, ExtensionError>;
    fn farewell(&self, url: &Url) -> Result<String, ExtensionError>;
}

/// Concrete implementation reporting which arguments reached it.
#[derive(Debug)]
struct NamedGreeting(&'static str);

impl Greeting for NamedGreeting {
    fn say_hello(&self, url: &Url, invocation: &dyn Invocation) -> Result<String, ExtensionError> {
        Ok(format!(
            "{}:{}:{}",
            self.0,
            invocation.method_name(),
            url.param_or("tag", "-")
        ))
    }

    fn farewell(&self, _url: &Url) -> Result<String, ExtensionError> {
        Ok(format!("bye from {}", self.0))
    }
}

/// The interpreted dispatcher for `Greeting`.
struct AdaptiveGreeting {
    loader: Arc<ExtensionLoader<dyn Greeting>>,
    say_hello: Arc<AdaptiveMethod>,
}

impl std::fmt::Debug for AdaptiveGreeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveGreeting").finish_non_exhaustive()
    }
}

impl Greeting for AdaptiveGreeting {
    fn say_hello(&self, url: &Url, invocation: &dyn Invocation) -> Result<String, ExtensionError> {
        let name = self.say_hello.resolve(url, Some(invocation))?;
        let extension = self.loader.get(&name)?;
        extension.say_hello(url, invocation)
    }

    fn farewell(&self, _url: &Url) -> Result<String, ExtensionError> {
        Err(ExtensionError::NotAdaptiveMethod {
            contract: "Greeting".to_string(),
            method: "farewell".to_string(),
        })
    }
}

fn greeting_spec() -> ContractSpec<dyn Greeting> {
    ContractSpec::<dyn Greeting>::new("Greeting")
        .with_default("polite")
        .with_provider(ProviderSpec::new("polite", || {
            Ok(Constructed::new(Arc::new(NamedGreeting("polite")) as Arc<dyn Greeting>))
        }))
        .with_provider(ProviderSpec::new("terse", || {
            Ok(Constructed::new(Arc::new(NamedGreeting("terse")) as Arc<dyn Greeting>))
        }))
        .with_method(
            MethodSpec::adaptive("say_hello")
                .with_keys(["greeting"])
                .with_params([ParamRole::Config, ParamRole::Invocation]),
        )
        .with_method(MethodSpec::plain("farewell").with_params([ParamRole::Config]))
        .with_adaptive(|methods, loader| {
            Ok(Arc::new(AdaptiveGreeting {
                loader,
                say_hello: methods.require("say_hello")?,
            }))
        })
}

fn greeting_registry() -> Arc<ExtensionRegistry> {
    let registry = ExtensionRegistry::new();
    registry.register(greeting_spec()).unwrap();
    registry
}

#[test]
fn test_adaptive_dispatcher_is_cached() {
    let registry = greeting_registry();

    let first = registry.get_adaptive_instance::<dyn Greeting>().unwrap();
    let second = registry.get_adaptive_instance::<dyn Greeting>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_dispatch_uses_default_when_unconfigured() {
    let registry = greeting_registry();
    let dispatcher = registry.get_adaptive_instance::<dyn Greeting>().unwrap();

    let url = Url::new();
    let invocation = RpcInvocation::new("say_hello");
    let reply = dispatcher.say_hello(&url, &invocation).unwrap();
    assert_eq!(reply, "polite:say_hello:-");
}

#[test]
fn test_dispatch_follows_configuration() {
    let registry = greeting_registry();
    let dispatcher = registry.get_adaptive_instance::<dyn Greeting>().unwrap();

    let url = Url::new().with_param("greeting", "terse").with_param("tag", "t1");
    let invocation = RpcInvocation::new("say_hello");

    // Arguments arrive at the selected implementation unchanged.
    let reply = dispatcher.say_hello(&url, &invocation).unwrap();
    assert_eq!(reply, "terse:say_hello:t1");
}

#[test]
fn test_dispatch_method_scoped_override() {
    let registry = greeting_registry();
    let dispatcher = registry.get_adaptive_instance::<dyn Greeting>().unwrap();

    let url = Url::new()
        .with_param("greeting", "polite")
        .with_method_param("say_hello", "greeting", "terse");

    let reply = dispatcher
        .say_hello(&url, &RpcInvocation::new("say_hello"))
        .unwrap();
    assert!(reply.starts_with("terse:"));
}

#[test]
fn test_dispatch_unknown_extension_propagates() {
    let registry = greeting_registry();
    let dispatcher = registry.get_adaptive_instance::<dyn Greeting>().unwrap();

    let url = Url::new().with_param("greeting", "nonexistent");
    let err = dispatcher
        .say_hello(&url, &RpcInvocation::new("say_hello"))
        .unwrap_err();
    assert!(matches!(err, ExtensionError::UnknownExtension { .. }));
}

#[test]
fn test_non_adaptive_method_always_fails() {
    let registry = greeting_registry();
    let dispatcher = registry.get_adaptive_instance::<dyn Greeting>().unwrap();

    // Independent of configuration contents.
    for url in [Url::new(), Url::new().with_param("greeting", "terse")] {
        let err = dispatcher.farewell(&url).unwrap_err();
        match err {
            ExtensionError::NotAdaptiveMethod { contract, method } => {
                assert_eq!(contract, "Greeting");
                assert_eq!(method, "farewell");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn test_contract_without_adaptive_methods() {
    let registry = ExtensionRegistry::new();
    registry
        .register(
            ContractSpec::<dyn Greeting>::new("Greeting")
                .with_provider(ProviderSpec::new("polite", || {
                    Ok(Constructed::new(Arc::new(NamedGreeting("polite")) as Arc<dyn Greeting>))
                }))
                .with_method(MethodSpec::plain("say_hello"))
                .with_method(MethodSpec::plain("farewell"))
                .with_adaptive(|methods, loader| {
                    Ok(Arc::new(AdaptiveGreeting {
                        loader,
                        say_hello: methods.require("say_hello")?,
                    }))
                }),
        )
        .unwrap();

    let err = registry.get_adaptive_instance::<dyn Greeting>().unwrap_err();
    assert!(matches!(err, ExtensionError::NotAdaptive { .. }));
}

#[test]
fn test_adaptive_method_without_config_param_fails_at_construction() {
    let registry = ExtensionRegistry::new();
    registry
        .register(
            ContractSpec::<dyn Greeting>::new("Greeting")
                .with_provider(ProviderSpec::new("polite", || {
                    Ok(Constructed::new(Arc::new(NamedGreeting("polite")) as Arc<dyn Greeting>))
                }))
                // No Config or ConfigSource among the parameter roles: the
                // dispatcher for this method can never be built.
                .with_method(
                    MethodSpec::adaptive("say_hello")
                        .with_params([ParamRole::Other, ParamRole::Invocation]),
                )
                .with_adaptive(|methods, loader| {
                    Ok(Arc::new(AdaptiveGreeting {
                        loader,
                        say_hello: methods.require("say_hello")?,
                    }))
                }),
        )
        .unwrap();

    let err = registry.get_adaptive_instance::<dyn Greeting>().unwrap_err();
    match err {
        ExtensionError::ConstructionFailed { name, reason, .. } => {
            assert_eq!(name, "$adaptive");
            assert!(reason.contains("no configuration parameter"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_no_default_declared() {
    let registry = ExtensionRegistry::new();
    registry
        .register(
            ContractSpec::<dyn Greeting>::new("Greeting").with_provider(ProviderSpec::new(
                "polite",
                || Ok(Constructed::new(Arc::new(NamedGreeting("polite")) as Arc<dyn Greeting>)),
            )),
        )
        .unwrap();

    let err = registry.get_default_instance::<dyn Greeting>().unwrap_err();
    assert!(matches!(err, ExtensionError::NoDefaultDeclared { .. }));
}
