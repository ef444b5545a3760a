//! Pure planning of install and uninstall orders.
//!
//! Planning never mutates anything; the lifecycle registry applies a plan.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::extension_system::error::{ExtensionSystemError, Result};
use crate::extension_system::graph::{DependencyGraph, Direction};
use crate::extension_system::info::ExtensionInfo;

/// Options for [`ActivationPlanner::plan_install`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Pull in missing dependencies automatically
    pub enable_dependencies: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            enable_dependencies: true,
        }
    }
}

/// Options for [`ActivationPlanner::plan_uninstall`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UninstallOptions {
    /// Uninstall enabled dependents too instead of refusing
    pub uninstall_dependents: bool,
}

/// Computes activation plans over a snapshot of extension descriptors.
#[derive(Debug, Clone, Default)]
pub struct ActivationPlanner {
    /// Installation profile pinned as a root
    profile: Option<String>,
}

fn requested_set<S: AsRef<str>>(requested: &[S]) -> BTreeSet<String> {
    requested.iter().map(|n| n.as_ref().to_string()).collect()
}

fn index_by_name(extensions: &[ExtensionInfo]) -> Result<HashMap<&str, &ExtensionInfo>> {
    let mut index = HashMap::with_capacity(extensions.len());
    for info in extensions {
        if index.insert(info.name.as_str(), info).is_some() {
            return Err(ExtensionSystemError::DuplicateExtension {
                name: info.name.clone(),
            });
        }
    }
    Ok(index)
}

impl ActivationPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a planner that treats `profile` as a pinned root
    pub fn with_profile(profile: Option<String>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Install order for `requested`: the not-yet-enabled dependency closure,
    /// dependencies first.
    pub fn plan_install<S: AsRef<str>>(
        &self,
        requested: &[S],
        known: &[ExtensionInfo],
        already_enabled: &HashSet<String>,
        options: InstallOptions,
    ) -> Result<Vec<String>> {
        let requested = requested_set(requested);
        let index = index_by_name(known)?;

        for name in &requested {
            if !index.contains_key(name.as_str()) {
                return Err(ExtensionSystemError::UnknownExtension { name: name.clone() });
            }
            if already_enabled.contains(name) {
                return Err(ExtensionSystemError::AlreadyEnabled { name: name.clone() });
            }
        }
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let closure = if options.enable_dependencies {
            self.install_closure(&requested, &index, already_enabled)?
        } else {
            self.check_dependencies_enabled(&requested, &index, already_enabled)?;
            requested.clone()
        };

        self.check_versions(&closure, &index)?;

        let members: Vec<ExtensionInfo> = closure
            .iter()
            .filter_map(|name| index.get(name.as_str()).map(|info| (*info).clone()))
            .collect();
        let graph = DependencyGraph::restricted(&members)?;
        let roots: Vec<&str> = requested.iter().map(String::as_str).collect();
        let order = graph.topological_order(&roots, Direction::Forward)?;
        debug!("Install plan for {:?}: {:?}", requested, order);
        Ok(order)
    }

    /// Walks the requires relation from `requested`, stopping at enabled
    /// extensions. Every dependency must be known.
    fn install_closure(
        &self,
        requested: &BTreeSet<String>,
        index: &HashMap<&str, &ExtensionInfo>,
        already_enabled: &HashSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut closure = BTreeSet::new();
        let mut queue: Vec<&str> = requested.iter().rev().map(String::as_str).collect();

        while let Some(name) = queue.pop() {
            if !closure.insert(name.to_string()) {
                continue;
            }
            let Some(info) = index.get(name) else {
                continue;
            };
            for dep in info.requires.iter().rev() {
                if !index.contains_key(dep.name.as_str()) {
                    return Err(ExtensionSystemError::MissingDependency {
                        requester: name.to_string(),
                        missing: dep.name.clone(),
                    });
                }
                if !already_enabled.contains(&dep.name) && !closure.contains(&dep.name) {
                    queue.push(dep.name.as_str());
                }
            }
        }
        Ok(closure)
    }

    fn check_dependencies_enabled(
        &self,
        requested: &BTreeSet<String>,
        index: &HashMap<&str, &ExtensionInfo>,
        already_enabled: &HashSet<String>,
    ) -> Result<()> {
        for name in requested {
            let Some(info) = index.get(name.as_str()) else {
                continue;
            };
            for dep in &info.requires {
                if !index.contains_key(dep.name.as_str()) {
                    return Err(ExtensionSystemError::MissingDependency {
                        requester: name.clone(),
                        missing: dep.name.clone(),
                    });
                }
                if !already_enabled.contains(&dep.name) && !requested.contains(&dep.name) {
                    return Err(ExtensionSystemError::DependencyNotEnabled {
                        requester: name.clone(),
                        dependency: dep.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Every constrained edge leaving a planned extension must be satisfied by
    /// the declared version of its target.
    fn check_versions(
        &self,
        closure: &BTreeSet<String>,
        index: &HashMap<&str, &ExtensionInfo>,
    ) -> Result<()> {
        for name in closure {
            let Some(info) = index.get(name.as_str()) else {
                continue;
            };
            for dep in &info.requires {
                let Some(range) = &dep.version_range else {
                    continue;
                };
                let found = index
                    .get(dep.name.as_str())
                    .and_then(|target| target.version.clone());
                let satisfied = match &found {
                    Some(version) => range.includes_str(version).inspect_err(|e| {
                        warn!(
                            "Cannot check '{}' requirement '{}' on '{}': {}",
                            name, range, dep.name, e
                        );
                    })?,
                    None => false,
                };
                if !satisfied {
                    return Err(ExtensionSystemError::IncompatibleVersion {
                        requester: name.clone(),
                        dependency: dep.name.clone(),
                        constraint: range.constraint_string().to_string(),
                        found: found.unwrap_or_else(|| "unknown".to_string()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Uninstall order for `requested`, dependents first.
    ///
    /// Enabled dependents outside the request block the call unless
    /// `uninstall_dependents` is set. The pinned profile never blocks and is
    /// only uninstalled when requested explicitly.
    pub fn plan_uninstall<S: AsRef<str>>(
        &self,
        requested: &[S],
        enabled: &[ExtensionInfo],
        options: UninstallOptions,
    ) -> Result<Vec<String>> {
        let requested = requested_set(requested);
        let index = index_by_name(enabled)?;

        for name in &requested {
            if !index.contains_key(name.as_str()) {
                return Err(ExtensionSystemError::NotEnabled { name: name.clone() });
            }
        }
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let pinned = |name: &str| self.profile.as_deref() == Some(name) && !requested.contains(name);
        let graph = DependencyGraph::restricted(enabled)?;

        let targets = if options.uninstall_dependents {
            let mut closure = BTreeSet::new();
            let mut queue: Vec<&str> = requested.iter().map(String::as_str).collect();
            while let Some(name) = queue.pop() {
                if !closure.insert(name.to_string()) {
                    continue;
                }
                for dependent in graph.dependents_of(name) {
                    if !pinned(dependent) && !closure.contains(dependent) {
                        queue.push(dependent);
                    }
                }
            }
            closure
        } else {
            for name in &requested {
                let blocking: Vec<String> = graph
                    .dependents_of(name)
                    .into_iter()
                    .filter(|dependent| !requested.contains(*dependent) && !pinned(*dependent))
                    .map(str::to_string)
                    .collect();
                if !blocking.is_empty() {
                    return Err(ExtensionSystemError::DependentsStillEnabled {
                        name: name.clone(),
                        dependents: blocking,
                    });
                }
            }
            requested.clone()
        };

        let members: Vec<ExtensionInfo> = targets
            .iter()
            .filter_map(|name| index.get(name.as_str()).map(|info| (*info).clone()))
            .collect();
        let subgraph = DependencyGraph::restricted(&members)?;
        let roots: Vec<&str> = targets.iter().map(String::as_str).collect();
        let order = subgraph.topological_order(&roots, Direction::Reverse)?;
        debug!("Uninstall plan for {:?}: {:?}", requested, order);
        Ok(order)
    }
}
