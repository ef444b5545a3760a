//! # Modula Extension System
//!
//! Dependency resolution and lifecycle management for extensions.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`info`]**: [`ExtensionInfo`], the declared metadata of one extension.
//! - **[`dependency`]** and **[`version`]**: dependency declarations such as
//!   `help (>=8.x-1.0)` and the version normalisation behind them.
//! - **[`graph`]**: [`DependencyGraph`], cycle detection, closures and the
//!   weighted topological order.
//! - **[`planner`]**: [`ActivationPlanner`], pure computation of install and
//!   uninstall orders.
//! - **[`registry`]**: [`LifecycleRegistry`], the owned enabled set. Applies
//!   plans atomically and rolls back on hook failure.
//! - **[`traits`]**: the [`ExtensionSource`] and [`Lifecycle`] seams.
//! - **[`source`]**: in-memory and manifest-backed sources.
//! - **[`events`]**: change notifications for observers.
//! - **[`manager`]**: [`ExtensionManager`], the async lock-guarded facade.
//! - **[`error`]**: [`ExtensionSystemError`].
pub mod dependency;
pub mod error;
pub mod events;
pub mod graph;
pub mod info;
pub mod manager;
pub mod planner;
pub mod registry;
pub mod source;
pub mod traits;
pub mod version;

pub use dependency::ExtensionDependency;
pub use error::ExtensionSystemError;
pub use events::{LifecycleEvent, LifecycleObserver};
pub use graph::{DependencyGraph, Direction};
pub use info::ExtensionInfo;
pub use manager::{DefaultExtensionManager, ExtensionManager};
pub use planner::{ActivationPlanner, InstallOptions, UninstallOptions};
pub use registry::{LifecycleRegistry, RegistryConfig, RegistryState};
pub use source::{ManifestSource, StaticExtensionSource};
pub use traits::{ExtensionSource, HookError, Lifecycle};
pub use version::VersionRange;

#[cfg(test)]
mod tests;
