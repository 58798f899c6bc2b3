//! Per-contract extension loader: singleton cache and cyclic-safe wiring.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::debug;

use super::adaptive::AdaptiveMethods;
use super::error::{ExtensionError, Result};
use super::registry::ExtensionRegistry;
use super::spec::{Constructed, ContractSpec, ADAPTIVE_NAME};
use crate::url::Url;

/// Marker for a construction in flight.
struct InProgress<C: ?Sized> {
    owner: ThreadId,
    published: Option<Arc<C>>,
}

/// What the current thread found for a name in the coordination map.
enum Claim<C: ?Sized> {
    /// This thread is already constructing the name (dependency cycle).
    Reentrant(Option<Arc<C>>),
    /// Another thread is constructing the name.
    Wait,
    /// Nobody is; the current thread takes over.
    Vacant,
}

/// Caches and wires the named implementations of one contract.
///
/// Instances are constructed lazily on first request and memoized for the
/// loader's lifetime: for a fixed name, every resolution yields the same
/// `Arc`. Construction follows publish-before-wire ordering: the bare
/// instance enters the in-progress marker under its final key *before* its
/// dependencies are wired, so a dependency chain that cycles back to the
/// name under construction receives the already-published instance instead
/// of recursing without bound.
///
/// Concurrency: at most one construction runs per name; other threads
/// requesting the same name wait for it to finish and only ever observe
/// the fully wired instance. The one sanctioned exception is the
/// cycle-breaking path above, which hands the constructing thread itself a
/// published, not-yet-wired instance. Reads after first construction take
/// no construction lock, and the coordination lock is never held while a
/// user constructor or wire hook runs. A cycle therefore resolves entirely
/// on the thread that started it.
pub struct ExtensionLoader<C: ?Sized + Send + Sync + 'static> {
    spec: ContractSpec<C>,
    registry: Weak<ExtensionRegistry>,
    weak_self: Weak<ExtensionLoader<C>>,
    instances: RwLock<HashMap<String, Arc<C>>>,
    building: Mutex<HashMap<String, InProgress<C>>>,
    built: Condvar,
}

impl<C: ?Sized + Send + Sync + 'static> std::fmt::Debug for ExtensionLoader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("contract", &self.spec.name())
            .finish_non_exhaustive()
    }
}

impl<C: ?Sized + Send + Sync + 'static> ExtensionLoader<C> {
    pub(crate) fn new(spec: ContractSpec<C>, registry: Weak<ExtensionRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            spec,
            registry,
            weak_self: weak_self.clone(),
            instances: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
            built: Condvar::new(),
        })
    }

    /// The contract name.
    pub fn contract_name(&self) -> &str {
        self.spec.name()
    }

    /// All declared implementation names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.spec.provider_names()
    }

    /// Whether `name` is declared for this contract.
    pub fn contains(&self, name: &str) -> bool {
        self.spec.find_provider(name).is_some()
    }

    /// Get the cached instance for `name`, constructing and wiring it on
    /// first call.
    pub fn get(&self, name: &str) -> Result<Arc<C>> {
        if name == ADAPTIVE_NAME {
            return Err(self.unknown(name));
        }
        loop {
            if let Some(found) = self.instances.read().get(name) {
                return Ok(found.clone());
            }

            let mut building = self.building.lock();
            // A finishing constructor fills the instance cache before it
            // clears its marker, so re-check under the coordination lock.
            if let Some(found) = self.instances.read().get(name) {
                return Ok(found.clone());
            }

            let claim = match building.get(name) {
                Some(entry) if entry.owner == thread::current().id() => {
                    Claim::Reentrant(entry.published.clone())
                }
                Some(_) => Claim::Wait,
                None => Claim::Vacant,
            };

            match claim {
                Claim::Reentrant(Some(instance)) => return Ok(instance),
                Claim::Reentrant(None) => {
                    return Err(self.construction_failed(
                        name,
                        "constructor re-entered before the instance was published".to_string(),
                    ))
                }
                Claim::Wait => {
                    self.built.wait(&mut building);
                    continue;
                }
                Claim::Vacant => {
                    if self.spec.find_provider(name).is_none() {
                        return Err(self.unknown(name));
                    }
                    building.insert(
                        name.to_string(),
                        InProgress {
                            owner: thread::current().id(),
                            published: None,
                        },
                    );
                    drop(building);
                    return self.finish(name, self.construct(name));
                }
            }
        }
    }

    /// Get the instance of the contract's declared default implementation.
    pub fn get_default(&self) -> Result<Arc<C>> {
        match self.spec.default_name() {
            Some(name) => self.get(name),
            None => Err(ExtensionError::NoDefaultDeclared {
                contract: self.spec.name().to_string(),
            }),
        }
    }

    /// Get the adaptive dispatcher, constructing it once.
    ///
    /// The dispatcher is cached under the reserved pseudo-name
    /// [`ADAPTIVE_NAME`], through the same single-construction machinery
    /// as regular instances.
    pub fn get_adaptive(&self) -> Result<Arc<C>> {
        loop {
            if let Some(found) = self.instances.read().get(ADAPTIVE_NAME) {
                return Ok(found.clone());
            }
            if self.spec.adaptive_factory().is_none() {
                return Err(ExtensionError::NotAdaptive {
                    contract: self.spec.name().to_string(),
                });
            }

            let mut building = self.building.lock();
            if let Some(found) = self.instances.read().get(ADAPTIVE_NAME) {
                return Ok(found.clone());
            }

            let claim = match building.get(ADAPTIVE_NAME) {
                Some(entry) if entry.owner == thread::current().id() => {
                    Claim::Reentrant(entry.published.clone())
                }
                Some(_) => Claim::Wait,
                None => Claim::Vacant,
            };

            match claim {
                Claim::Reentrant(_) => {
                    return Err(self.construction_failed(
                        ADAPTIVE_NAME,
                        "adaptive dispatcher construction re-entered".to_string(),
                    ))
                }
                Claim::Wait => {
                    self.built.wait(&mut building);
                    continue;
                }
                Claim::Vacant => {
                    building.insert(
                        ADAPTIVE_NAME.to_string(),
                        InProgress {
                            owner: thread::current().id(),
                            published: None,
                        },
                    );
                    drop(building);
                    return self.finish(ADAPTIVE_NAME, self.construct_adaptive());
                }
            }
        }
    }

    /// Every activated instance for `url`, in activation order.
    ///
    /// A provider participates when it declares an activation condition,
    /// is not listed in `excluded`, belongs to the requested `group`, and
    /// its condition holds for `url`. The result is ordered by declared
    /// order with ties broken by declaration order, which stays stable
    /// across repeated calls with the same inputs.
    pub fn get_activated(
        &self,
        url: &Url,
        excluded: &[&str],
        group: Option<&str>,
    ) -> Result<Vec<Arc<C>>> {
        let mut selected: Vec<(i32, usize, &str)> = Vec::new();
        for (index, provider) in self.spec.providers().iter().enumerate() {
            let Some(activate) = provider.activate() else {
                continue;
            };
            if excluded.contains(&provider.name()) {
                continue;
            }
            if !activate.matches_group(group) || !activate.is_active(url) {
                continue;
            }
            selected.push((activate.order(), index, provider.name()));
        }
        selected.sort_by_key(|&(order, index, _)| (order, index));
        selected
            .into_iter()
            .map(|(_, _, name)| self.get(name))
            .collect()
    }

    /// Run the bare constructor, publish, then wire.
    fn construct(&self, name: &str) -> Result<Arc<C>> {
        debug!(
            contract = %self.spec.name(),
            extension = %name,
            "constructing extension"
        );
        let provider = self
            .spec
            .find_provider(name)
            .ok_or_else(|| self.unknown(name))?;
        let Constructed { instance, wire } = provider
            .construct()
            .map_err(|e| self.construction_failed(name, e.to_string()))?;

        // Publish before wiring: a dependency chain that cycles back to
        // this name must find the instance instead of re-entering
        // construction.
        {
            let mut building = self.building.lock();
            if let Some(entry) = building.get_mut(name) {
                entry.published = Some(instance.clone());
            }
        }

        if let Some(wire) = wire {
            let registry = self.registry.upgrade().ok_or_else(|| {
                self.construction_failed(name, "extension registry dropped during wiring".to_string())
            })?;
            wire(&registry).map_err(|e| self.construction_failed(name, e.to_string()))?;
        }

        Ok(instance)
    }

    fn construct_adaptive(&self) -> Result<Arc<C>> {
        debug!(contract = %self.spec.name(), "constructing adaptive dispatcher");
        let methods = AdaptiveMethods::from_methods(
            self.spec.name(),
            self.spec.default_name(),
            self.spec.methods(),
        )
        .map_err(|e| self.construction_failed(ADAPTIVE_NAME, e.to_string()))?;

        if methods.is_empty() {
            return Err(ExtensionError::NotAdaptive {
                contract: self.spec.name().to_string(),
            });
        }

        let factory = self.spec.adaptive_factory().ok_or_else(|| {
            ExtensionError::NotAdaptive {
                contract: self.spec.name().to_string(),
            }
        })?;
        let loader = self.weak_self.upgrade().ok_or_else(|| {
            self.construction_failed(ADAPTIVE_NAME, "extension loader dropped".to_string())
        })?;

        factory(methods, loader).map_err(|e| self.construction_failed(ADAPTIVE_NAME, e.to_string()))
    }

    /// Commit or roll back a construction, then wake waiters.
    ///
    /// A failed construction leaves no phantom in-progress entry behind, so
    /// a later caller can attempt construction again cleanly.
    fn finish(&self, name: &str, outcome: Result<Arc<C>>) -> Result<Arc<C>> {
        if let Ok(instance) = &outcome {
            self.instances
                .write()
                .insert(name.to_string(), instance.clone());
        }
        let mut building = self.building.lock();
        building.remove(name);
        self.built.notify_all();
        drop(building);
        outcome
    }

    fn unknown(&self, name: &str) -> ExtensionError {
        ExtensionError::UnknownExtension {
            contract: self.spec.name().to_string(),
            name: name.to_string(),
        }
    }

    fn construction_failed(&self, name: &str, reason: String) -> ExtensionError {
        ExtensionError::ConstructionFailed {
            contract: self.spec.name().to_string(),
            name: name.to_string(),
            reason,
        }
    }
}
