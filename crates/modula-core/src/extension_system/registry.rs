use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::extension_system::error::{ExtensionSystemError, Result};
use crate::extension_system::events::{LifecycleEvent, LifecycleObserver};
use crate::extension_system::graph::{DependencyGraph, Direction};
use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::planner::{ActivationPlanner, InstallOptions, UninstallOptions};
use crate::extension_system::traits::ExtensionSource;

/// Explicit construction-time configuration of a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Extensions enabled at startup, without running hooks
    #[serde(default)]
    pub initial: Vec<String>,
    /// Active installation profile, pinned as a root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Weight overrides
    #[serde(default)]
    pub weights: BTreeMap<String, i32>,
}

/// Snapshot of the mutable registry state, for external persistence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Enabled extensions in listing order
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Weight overrides
    #[serde(default)]
    pub weights: BTreeMap<String, i32>,
}

impl RegistryState {
    /// Turn a persisted state back into a seed configuration
    pub fn into_config(self, profile: Option<String>) -> RegistryConfig {
        RegistryConfig {
            initial: self.enabled,
            profile,
            weights: self.weights,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Install,
    Uninstall,
}

/// Copy of a declared descriptor with registry-owned fields applied.
fn effective(info: &ExtensionInfo, weights: &BTreeMap<String, i32>, enabled: bool) -> ExtensionInfo {
    let mut info = info.clone();
    if let Some(weight) = weights.get(&info.name) {
        info.weight = *weight;
    }
    info.enabled = enabled;
    info
}

/// Owner of the enabled extension set.
///
/// Every mutation either completes or leaves the registry unchanged: plans
/// are computed first, hooks run against a working copy, and the copy is
/// committed only after the last hook succeeded.
pub struct LifecycleRegistry {
    source: Arc<dyn ExtensionSource>,
    /// Declared extensions, refreshed from the source before each mutation
    known: BTreeMap<String, ExtensionInfo>,
    /// Enabled extensions with effective weights
    enabled: BTreeMap<String, ExtensionInfo>,
    /// Weight overrides owned by the registry
    weights: BTreeMap<String, i32>,
    planner: ActivationPlanner,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl LifecycleRegistry {
    /// Create a registry seeded with `config.initial` (plus the profile).
    pub fn new(source: Arc<dyn ExtensionSource>, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self {
            source,
            known: BTreeMap::new(),
            enabled: BTreeMap::new(),
            weights: BTreeMap::new(),
            planner: ActivationPlanner::with_profile(config.profile.clone()),
            observers: Vec::new(),
        };
        registry.refresh()?;

        for (name, weight) in config.weights {
            if registry.known.contains_key(&name) {
                registry.weights.insert(name, weight);
            } else {
                warn!("Ignoring weight override for unknown extension '{}'", name);
            }
        }

        let mut seed = config.initial;
        if let Some(profile) = config.profile {
            if !seed.contains(&profile) {
                seed.push(profile);
            }
        }
        registry.enabled = registry.resolve_module_list(&seed)?;
        info!(
            "Lifecycle registry seeded with {} enabled extension(s)",
            registry.enabled.len()
        );
        Ok(registry)
    }

    /// Re-read declared metadata from the source.
    pub fn refresh(&mut self) -> Result<()> {
        let mut known = BTreeMap::new();
        for info in self.source.list()? {
            if known.contains_key(&info.name) {
                return Err(ExtensionSystemError::DuplicateExtension { name: info.name });
            }
            known.insert(info.name.clone(), info);
        }
        self.known = known;

        for (name, info) in self.enabled.iter_mut() {
            match self.known.get(name) {
                Some(declared) => *info = effective(declared, &self.weights, true),
                None => warn!("Enabled extension '{}' is no longer provided by the source", name),
            }
        }
        debug!("Refreshed {} known extension(s)", self.known.len());
        Ok(())
    }

    /// Validate `names` as a complete enabled set and resolve descriptors.
    fn resolve_module_list<S: AsRef<str>>(&self, names: &[S]) -> Result<BTreeMap<String, ExtensionInfo>> {
        let members: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        let mut resolved = BTreeMap::new();

        for name in &members {
            let declared = self
                .known
                .get(*name)
                .ok_or_else(|| ExtensionSystemError::UnknownExtension {
                    name: name.to_string(),
                })?;
            // The profile may outlive its own dependencies.
            if self.planner.profile() != Some(*name) {
                if let Some(missing) = declared.dependency_names().find(|dep| !members.contains(dep)) {
                    return Err(ExtensionSystemError::InconsistentModuleList {
                        name: name.to_string(),
                        missing: missing.to_string(),
                    });
                }
            }
            resolved.insert(name.to_string(), effective(declared, &self.weights, true));
        }
        Ok(resolved)
    }

    fn known_infos(&self) -> Vec<ExtensionInfo> {
        self.known
            .values()
            .map(|info| effective(info, &self.weights, self.enabled.contains_key(&info.name)))
            .collect()
    }

    fn enabled_names(&self) -> HashSet<String> {
        self.enabled.keys().cloned().collect()
    }

    /// Register an observer for committed changes
    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    fn notify(&self, event: LifecycleEvent) {
        debug!("Lifecycle event: {}", event);
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// Install `names` and their missing dependencies.
    pub fn install<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<String>> {
        self.install_with(names, InstallOptions::default())
    }

    /// Install `names`; returns the applied order.
    pub fn install_with<S: AsRef<str>>(&mut self, names: &[S], options: InstallOptions) -> Result<Vec<String>> {
        self.refresh()?;
        let plan = self
            .planner
            .plan_install(names, &self.known_infos(), &self.enabled_names(), options)?;
        if plan.is_empty() {
            return Ok(plan);
        }

        let staged = plan
            .iter()
            .map(|name| {
                self.known
                    .get(name)
                    .map(|declared| effective(declared, &self.weights, true))
                    .ok_or_else(|| ExtensionSystemError::UnknownExtension { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Installing extensions: {}", plan.join(", "));
        let mut working = self.enabled.clone();
        let mut applied: Vec<String> = Vec::with_capacity(plan.len());

        for info in staged {
            if let Some(hooks) = self.source.lifecycle(&info.name) {
                debug!("Running install hook for '{}'", info.name);
                if let Err(cause) = hooks.on_install(&info.name) {
                    error!("Install hook for '{}' failed: {}", info.name, cause);
                    let rolled_back = self.compensate(&applied, Phase::Install);
                    return Err(ExtensionSystemError::HookFailure {
                        name: info.name,
                        cause,
                        rolled_back,
                    });
                }
            }
            applied.push(info.name.clone());
            working.insert(info.name.clone(), info);
        }

        self.enabled = working;
        self.notify(LifecycleEvent::Installed { names: plan.clone() });
        Ok(plan)
    }

    /// Uninstall `names`, refusing while enabled dependents remain.
    pub fn uninstall<S: AsRef<str>>(&mut self, names: &[S]) -> Result<Vec<String>> {
        self.uninstall_with(names, UninstallOptions::default())
    }

    /// Uninstall `names`; returns the applied order.
    pub fn uninstall_with<S: AsRef<str>>(&mut self, names: &[S], options: UninstallOptions) -> Result<Vec<String>> {
        self.refresh()?;
        let enabled: Vec<ExtensionInfo> = self.enabled.values().cloned().collect();
        let plan = self.planner.plan_uninstall(names, &enabled, options)?;
        if plan.is_empty() {
            return Ok(plan);
        }

        info!("Uninstalling extensions: {}", plan.join(", "));
        let mut working = self.enabled.clone();
        let mut applied: Vec<String> = Vec::with_capacity(plan.len());

        for name in &plan {
            if let Some(hooks) = self.source.lifecycle(name) {
                debug!("Running uninstall hook for '{}'", name);
                if let Err(cause) = hooks.on_uninstall(name) {
                    error!("Uninstall hook for '{}' failed: {}", name, cause);
                    let rolled_back = self.compensate(&applied, Phase::Uninstall);
                    return Err(ExtensionSystemError::HookFailure {
                        name: name.clone(),
                        cause,
                        rolled_back,
                    });
                }
            }
            working.remove(name);
            applied.push(name.clone());
        }

        self.enabled = working;
        self.notify(LifecycleEvent::Uninstalled { names: plan.clone() });
        Ok(plan)
    }

    /// Undo the hooks of `applied` in reverse order. Failures are logged and
    /// do not stop the remaining compensation.
    fn compensate(&self, applied: &[String], phase: Phase) -> Vec<String> {
        let mut rolled_back = Vec::with_capacity(applied.len());
        for name in applied.iter().rev() {
            if let Some(hooks) = self.source.lifecycle(name) {
                let result = match phase {
                    Phase::Install => hooks.on_uninstall(name),
                    Phase::Uninstall => hooks.on_install(name),
                };
                if let Err(e) = result {
                    error!("Rollback of '{}' failed: {}", name, e);
                }
            }
            rolled_back.push(name.clone());
        }
        if !rolled_back.is_empty() {
            warn!("Rolled back: {}", rolled_back.join(", "));
        }
        rolled_back
    }

    /// Change the weight of a known extension.
    pub fn set_weight(&mut self, name: &str, weight: i32) -> Result<()> {
        if !self.known.contains_key(name) {
            self.refresh()?;
        }
        if !self.known.contains_key(name) {
            return Err(ExtensionSystemError::UnknownExtension {
                name: name.to_string(),
            });
        }

        self.weights.insert(name.to_string(), weight);
        if let Some(info) = self.enabled.get_mut(name) {
            info.weight = weight;
        }
        info!("Weight of '{}' set to {}", name, weight);
        self.notify(LifecycleEvent::WeightChanged {
            name: name.to_string(),
            weight,
        });
        Ok(())
    }

    /// Replace the enabled set without running hooks.
    ///
    /// The given order is not kept; the set lists like `list_enabled`.
    pub fn set_module_list<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.refresh()?;
        self.enabled = self.resolve_module_list(names)?;
        let names = self.list_enabled();
        info!("Module list replaced: {}", names.join(", "));
        self.notify(LifecycleEvent::ModuleListReplaced { names });
        Ok(())
    }

    /// Enabled extensions, dependencies first, ties by (weight, name).
    pub fn list_enabled(&self) -> Vec<String> {
        let infos: Vec<ExtensionInfo> = self.enabled.values().cloned().collect();
        let roots: Vec<&str> = self.enabled.keys().map(String::as_str).collect();
        let ordered = DependencyGraph::restricted(&infos)
            .and_then(|graph| graph.topological_order(&roots, Direction::Forward));
        match ordered {
            Ok(order) => order,
            Err(e) => {
                warn!("Falling back to weight order for enabled list: {}", e);
                let mut fallback: Vec<&ExtensionInfo> = self.enabled.values().collect();
                fallback.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.name.cmp(&b.name)));
                fallback.into_iter().map(|info| info.name.clone()).collect()
            }
        }
    }

    /// Install order `names` would produce, without applying it.
    pub fn preview_install<S: AsRef<str>>(&self, names: &[S], options: InstallOptions) -> Result<Vec<String>> {
        self.planner
            .plan_install(names, &self.known_infos(), &self.enabled_names(), options)
    }

    /// Uninstall order `names` would produce, without applying it.
    pub fn preview_uninstall<S: AsRef<str>>(&self, names: &[S], options: UninstallOptions) -> Result<Vec<String>> {
        let enabled: Vec<ExtensionInfo> = self.enabled.values().cloned().collect();
        self.planner.plan_uninstall(names, &enabled, options)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains_key(name)
    }

    /// Descriptor of an enabled extension
    pub fn enabled_info(&self, name: &str) -> Option<&ExtensionInfo> {
        self.enabled.get(name)
    }

    /// Descriptor of a known extension with registry-owned fields applied
    pub fn known_info(&self, name: &str) -> Option<ExtensionInfo> {
        self.known
            .get(name)
            .map(|info| effective(info, &self.weights, self.enabled.contains_key(name)))
    }

    /// All known extensions, sorted by name
    pub fn known_extensions(&self) -> Vec<ExtensionInfo> {
        self.known_infos()
    }

    /// Effective weight of a known extension
    pub fn weight_of(&self, name: &str) -> Option<i32> {
        self.known_info(name).map(|info| info.weight)
    }

    /// Direct dependencies declared by `name`
    pub fn dependencies_of(&self, name: &str) -> Result<Vec<String>> {
        self.known
            .get(name)
            .map(|info| info.dependency_names().map(str::to_string).collect())
            .ok_or_else(|| ExtensionSystemError::UnknownExtension {
                name: name.to_string(),
            })
    }

    /// Known extensions that directly require `name`
    pub fn dependents_of(&self, name: &str) -> Result<Vec<String>> {
        let graph = DependencyGraph::restricted(&self.known_infos())?;
        if !graph.contains(name) {
            return Err(ExtensionSystemError::UnknownExtension {
                name: name.to_string(),
            });
        }
        Ok(graph.dependents_of(name).into_iter().map(str::to_string).collect())
    }

    pub fn profile(&self) -> Option<&str> {
        self.planner.profile()
    }

    /// Persistable snapshot of the enabled set and weight overrides
    pub fn snapshot(&self) -> RegistryState {
        RegistryState {
            enabled: self.list_enabled(),
            weights: self.weights.clone(),
        }
    }

    /// Teardown: forget enabled extensions, weights and observers.
    pub fn clear(&mut self) {
        self.enabled.clear();
        self.weights.clear();
        self.observers.clear();
        debug!("Lifecycle registry cleared");
    }
}

impl fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRegistry")
            .field("enabled", &self.enabled.keys().collect::<Vec<_>>())
            .field("weights", &self.weights)
            .field("profile", &self.planner.profile())
            .finish_non_exhaustive()
    }
}
