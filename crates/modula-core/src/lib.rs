pub mod extension_system;
pub mod kernel;
pub mod storage;

pub use extension_system::{
    ActivationPlanner, DefaultExtensionManager, DependencyGraph, ExtensionInfo, ExtensionManager,
    ExtensionSource, ExtensionSystemError, Lifecycle, LifecycleRegistry, RegistryConfig,
};
pub use kernel::error::Error as KernelError;
pub use storage::SiteManifest;

#[cfg(test)]
mod tests;
