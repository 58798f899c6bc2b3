//! The contract directory: one extension loader per contract type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::info;

use super::error::{ExtensionError, Result};
use super::loader::ExtensionLoader;
use super::spec::ContractSpec;

static GLOBAL: Lazy<Arc<ExtensionRegistry>> = Lazy::new(ExtensionRegistry::new);

/// Directory mapping contract types to their extension loaders.
///
/// The framework runs one process-wide registry ([`ExtensionRegistry::global`],
/// created lazily and living until process exit), but registries are plain
/// values: tests create isolated ones with [`ExtensionRegistry::new`] and
/// drop them when done.
pub struct ExtensionRegistry {
    loaders: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    weak_self: Weak<ExtensionRegistry>,
}

impl ExtensionRegistry {
    /// Create an isolated registry.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            loaders: RwLock::new(HashMap::new()),
            weak_self: weak_self.clone(),
        })
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Register a contract, creating its loader.
    ///
    /// Fails when the provider table is malformed or the contract type is
    /// already registered.
    pub fn register<C: ?Sized + Send + Sync + 'static>(
        &self,
        spec: ContractSpec<C>,
    ) -> Result<Arc<ExtensionLoader<C>>> {
        spec.validate()?;
        let contract = spec.name().to_string();

        let mut loaders = self.loaders.write();
        if loaders.contains_key(&TypeId::of::<C>()) {
            return Err(ExtensionError::argument(format!(
                "contract {} is already registered",
                contract
            )));
        }

        let loader = ExtensionLoader::new(spec, self.weak_self.clone());
        loaders.insert(TypeId::of::<C>(), Box::new(loader.clone()));
        drop(loaders);

        info!(contract = %contract, "contract registered");
        Ok(loader)
    }

    /// The loader for contract `C`.
    pub fn loader<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<ExtensionLoader<C>>> {
        self.loaders
            .read()
            .get(&TypeId::of::<C>())
            .and_then(|any| any.downcast_ref::<Arc<ExtensionLoader<C>>>())
            .cloned()
            .ok_or_else(|| ExtensionError::UnknownContract {
                contract: std::any::type_name::<C>().to_string(),
            })
    }

    /// Whether contract `C` is registered.
    pub fn contains<C: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.loaders.read().contains_key(&TypeId::of::<C>())
    }

    /// Shorthand for `loader::<C>()?.get(name)`.
    pub fn get_instance<C: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<C>> {
        self.loader::<C>()?.get(name)
    }

    /// Shorthand for `loader::<C>()?.get_default()`.
    pub fn get_default_instance<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        self.loader::<C>()?.get_default()
    }

    /// Shorthand for `loader::<C>()?.get_adaptive()`.
    pub fn get_adaptive_instance<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        self.loader::<C>()?.get_adaptive()
    }
}
