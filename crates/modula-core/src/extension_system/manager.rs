use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use tokio::sync::RwLock;

use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::planner::{InstallOptions, UninstallOptions};
use crate::extension_system::registry::{LifecycleRegistry, RegistryConfig, RegistryState};
use crate::extension_system::traits::ExtensionSource;
use crate::kernel::component::KernelComponent;
use crate::kernel::error::{Error, LifecyclePhase, Result};

/// Extension system component interface.
///
/// Mutations hold the registry's write lock for the whole plan-then-apply
/// sequence; queries take the read lock and never observe a half-applied
/// plan.
#[async_trait]
pub trait ExtensionManager: KernelComponent {
    /// Install extensions and their missing dependencies
    async fn install(&self, names: &[String]) -> Result<Vec<String>>;

    async fn install_with(&self, names: &[String], options: InstallOptions) -> Result<Vec<String>>;

    /// Uninstall extensions with no enabled dependents left
    async fn uninstall(&self, names: &[String]) -> Result<Vec<String>>;

    async fn uninstall_with(&self, names: &[String], options: UninstallOptions) -> Result<Vec<String>>;

    /// Change the weight of an extension
    async fn set_weight(&self, name: &str, weight: i32) -> Result<()>;

    /// Replace the enabled set without running hooks
    async fn set_module_list(&self, names: &[String]) -> Result<()>;

    /// Enabled extensions in listing order
    async fn list_enabled(&self) -> Result<Vec<String>>;

    /// Check if an extension is enabled
    async fn is_enabled(&self, name: &str) -> Result<bool>;

    /// Descriptor of a known extension
    async fn get_extension(&self, name: &str) -> Result<Option<ExtensionInfo>>;

    /// Get extension dependencies
    async fn get_extension_dependencies(&self, name: &str) -> Result<Vec<String>>;

    /// Get extensions that depend on an extension
    async fn get_dependent_extensions(&self, name: &str) -> Result<Vec<String>>;

    /// Install order without applying it
    async fn plan_install(&self, names: &[String], options: InstallOptions) -> Result<Vec<String>>;

    /// Uninstall order without applying it
    async fn plan_uninstall(&self, names: &[String], options: UninstallOptions) -> Result<Vec<String>>;

    /// Persistable snapshot of the registry
    async fn snapshot(&self) -> Result<RegistryState>;
}

/// Default implementation of the extension manager
#[derive(Clone)]
pub struct DefaultExtensionManager {
    name: &'static str,
    registry: Arc<RwLock<LifecycleRegistry>>,
}

impl DefaultExtensionManager {
    /// Create a manager around a new registry
    pub fn new(source: Arc<dyn ExtensionSource>, config: RegistryConfig) -> Result<Self> {
        Ok(Self::from_registry(LifecycleRegistry::new(source, config)?))
    }

    pub fn from_registry(registry: LifecycleRegistry) -> Self {
        Self {
            name: "DefaultExtensionManager",
            registry: Arc::new(RwLock::new(registry)),
        }
    }

    /// Get reference to the registry Arc<RwLock>
    pub fn registry(&self) -> &Arc<RwLock<LifecycleRegistry>> {
        &self.registry
    }
}

impl Debug for DefaultExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultExtensionManager")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KernelComponent for DefaultExtensionManager {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(&self) -> Result<()> {
        let mut registry = self.registry.write().await;
        registry.refresh().map_err(|e| Error::ComponentLifecycle {
            component: self.name,
            phase: LifecyclePhase::Initialize,
            message: e.to_string(),
        })?;
        info!("Extension manager initialized");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let registry = self.registry.read().await;
        info!(
            "Extension manager started with {} enabled extension(s)",
            registry.list_enabled().len()
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut registry = self.registry.write().await;
        registry.clear();
        info!("Extension manager stopped");
        Ok(())
    }
}

#[async_trait]
impl ExtensionManager for DefaultExtensionManager {
    async fn install(&self, names: &[String]) -> Result<Vec<String>> {
        self.install_with(names, InstallOptions::default()).await
    }

    async fn install_with(&self, names: &[String], options: InstallOptions) -> Result<Vec<String>> {
        let mut registry = self.registry.write().await;
        Ok(registry.install_with(names, options)?)
    }

    async fn uninstall(&self, names: &[String]) -> Result<Vec<String>> {
        self.uninstall_with(names, UninstallOptions::default()).await
    }

    async fn uninstall_with(&self, names: &[String], options: UninstallOptions) -> Result<Vec<String>> {
        let mut registry = self.registry.write().await;
        Ok(registry.uninstall_with(names, options)?)
    }

    async fn set_weight(&self, name: &str, weight: i32) -> Result<()> {
        let mut registry = self.registry.write().await;
        Ok(registry.set_weight(name, weight)?)
    }

    async fn set_module_list(&self, names: &[String]) -> Result<()> {
        let mut registry = self.registry.write().await;
        Ok(registry.set_module_list(names)?)
    }

    async fn list_enabled(&self) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        Ok(registry.list_enabled())
    }

    async fn is_enabled(&self, name: &str) -> Result<bool> {
        let registry = self.registry.read().await;
        Ok(registry.is_enabled(name))
    }

    async fn get_extension(&self, name: &str) -> Result<Option<ExtensionInfo>> {
        let registry = self.registry.read().await;
        Ok(registry.known_info(name))
    }

    async fn get_extension_dependencies(&self, name: &str) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        Ok(registry.dependencies_of(name)?)
    }

    async fn get_dependent_extensions(&self, name: &str) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        Ok(registry.dependents_of(name)?)
    }

    async fn plan_install(&self, names: &[String], options: InstallOptions) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        Ok(registry.preview_install(names, options)?)
    }

    async fn plan_uninstall(&self, names: &[String], options: UninstallOptions) -> Result<Vec<String>> {
        let registry = self.registry.read().await;
        Ok(registry.preview_uninstall(names, options)?)
    }

    async fn snapshot(&self) -> Result<RegistryState> {
        let registry = self.registry.read().await;
        Ok(registry.snapshot())
    }
}
