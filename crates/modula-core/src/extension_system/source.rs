//! Extension sources shipped with the core.
//!
//! [`StaticExtensionSource`] keeps descriptors in memory and is what embedders
//! and tests use. [`ManifestSource`] re-reads a site manifest on every
//! [`ExtensionSource::list`] call, so a registry refresh picks up edits.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::extension_system::error::{ExtensionSystemError, Result};
use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::traits::{ExtensionSource, Lifecycle};
use crate::storage::config::SiteManifest;

fn poisoned(what: &str) -> ExtensionSystemError {
    ExtensionSystemError::Source {
        message: format!("{} lock poisoned", what),
    }
}

/// Hooks keyed by extension name, with an optional fallback for all others.
#[derive(Clone, Default)]
struct HookTable {
    hooks: HashMap<String, Arc<dyn Lifecycle>>,
    fallback: Option<Arc<dyn Lifecycle>>,
}

impl HookTable {
    fn get(&self, name: &str) -> Option<Arc<dyn Lifecycle>> {
        self.hooks.get(name).cloned().or_else(|| self.fallback.clone())
    }
}

/// In-memory extension source
#[derive(Default)]
pub struct StaticExtensionSource {
    extensions: RwLock<BTreeMap<String, ExtensionInfo>>,
    hooks: HookTable,
}

impl StaticExtensionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from a list of descriptors; later duplicates win.
    pub fn from_extensions(extensions: impl IntoIterator<Item = ExtensionInfo>) -> Self {
        let map = extensions.into_iter().map(|info| (info.name.clone(), info)).collect();
        Self {
            extensions: RwLock::new(map),
            hooks: HookTable::default(),
        }
    }

    /// Add a descriptor
    pub fn with_extension(mut self, info: ExtensionInfo) -> Self {
        if let Ok(extensions) = self.extensions.get_mut() {
            extensions.insert(info.name.clone(), info);
        }
        self
    }

    /// Attach hooks to a single extension
    pub fn with_lifecycle(mut self, name: &str, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks.hooks.insert(name.to_string(), hooks);
        self
    }

    /// Hooks used by every extension without its own
    pub fn with_default_lifecycle(mut self, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks.fallback = Some(hooks);
        self
    }

    /// Insert or replace a descriptor at runtime.
    ///
    /// The change becomes visible to a registry on its next refresh.
    pub fn upsert(&self, info: ExtensionInfo) -> Result<()> {
        let mut extensions = self.extensions.write().map_err(|_| poisoned("extensions"))?;
        debug!("Source now declares '{}'", info.name);
        extensions.insert(info.name.clone(), info);
        Ok(())
    }

    /// Remove a descriptor at runtime
    pub fn remove(&self, name: &str) -> Result<Option<ExtensionInfo>> {
        let mut extensions = self.extensions.write().map_err(|_| poisoned("extensions"))?;
        Ok(extensions.remove(name))
    }
}

impl ExtensionSource for StaticExtensionSource {
    fn list(&self) -> Result<Vec<ExtensionInfo>> {
        let extensions = self.extensions.read().map_err(|_| poisoned("extensions"))?;
        Ok(extensions.values().cloned().collect())
    }

    fn lifecycle(&self, name: &str) -> Option<Arc<dyn Lifecycle>> {
        self.hooks.get(name)
    }
}

impl fmt::Debug for StaticExtensionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .extensions
            .read()
            .map(|extensions| extensions.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("StaticExtensionSource")
            .field("extensions", &names)
            .field("hooks", &self.hooks.hooks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Extension source backed by a site manifest file
#[derive(Clone)]
pub struct ManifestSource {
    path: PathBuf,
    hooks: HookTable,
}

impl ManifestSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            hooks: HookTable::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Attach hooks to a single extension
    pub fn with_lifecycle(mut self, name: &str, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks.hooks.insert(name.to_string(), hooks);
        self
    }

    /// Hooks used by every extension without its own
    pub fn with_default_lifecycle(mut self, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks.fallback = Some(hooks);
        self
    }

    /// Read the manifest
    pub fn manifest(&self) -> Result<SiteManifest> {
        SiteManifest::load(&self.path).map_err(|e| ExtensionSystemError::Source {
            message: e.to_string(),
        })
    }
}

impl ExtensionSource for ManifestSource {
    fn list(&self) -> Result<Vec<ExtensionInfo>> {
        Ok(self.manifest()?.extensions)
    }

    fn lifecycle(&self, name: &str) -> Option<Arc<dyn Lifecycle>> {
        self.hooks.get(name)
    }
}

impl fmt::Debug for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
