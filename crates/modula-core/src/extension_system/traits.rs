use std::sync::Arc;

use thiserror::Error;

use crate::extension_system::error::Result;
use crate::extension_system::info::ExtensionInfo;

/// Failure reported by an install or uninstall hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        HookError::new(message)
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        HookError::new(message)
    }
}

/// Lifecycle capability of an extension.
///
/// Hooks run synchronously in plan order. Their side effects are opaque to
/// the registry; a returned error aborts the current call and triggers
/// compensation of the steps already applied.
pub trait Lifecycle: Send + Sync {
    /// Called before `name` is marked enabled
    fn on_install(&self, name: &str) -> std::result::Result<(), HookError>;

    /// Called before `name` is marked disabled
    fn on_uninstall(&self, name: &str) -> std::result::Result<(), HookError>;
}

/// Supplier of declared extension metadata and lifecycle hooks
pub trait ExtensionSource: Send + Sync {
    /// All known extensions
    fn list(&self) -> Result<Vec<ExtensionInfo>>;

    /// Hooks for `name`; `None` means the extension has no hooks
    fn lifecycle(&self, name: &str) -> Option<Arc<dyn Lifecycle>>;
}
