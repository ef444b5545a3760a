//! # Modula Extension System Errors
//!
//! Defines [`ExtensionSystemError`], the structured result of every failed
//! planning or lifecycle operation. A failed call never leaves the enabled
//! set partially updated, so each variant describes a call that changed
//! nothing.
use thiserror::Error;

use crate::extension_system::traits::HookError;
use crate::extension_system::version::VersionError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionSystemError {
    #[error("Extension '{requester}' requires '{missing}', which is not available")]
    MissingDependency { requester: String, missing: String },

    #[error("Circular dependency detected: {}", .members.join(" -> "))]
    CircularDependency { members: Vec<String> },

    #[error("Cannot uninstall '{name}': still required by {}", .dependents.join(", "))]
    DependentsStillEnabled { name: String, dependents: Vec<String> },

    #[error("Extension '{name}' is already enabled")]
    AlreadyEnabled { name: String },

    #[error("Extension '{name}' is not enabled")]
    NotEnabled { name: String },

    #[error("Hook for extension '{name}' failed: {cause} (rolled back: [{}])", .rolled_back.join(", "))]
    HookFailure {
        name: String,
        #[source]
        cause: HookError,
        rolled_back: Vec<String>,
    },

    #[error("Extension '{requester}' requires '{dependency}' version '{constraint}' but found '{found}'")]
    IncompatibleVersion {
        requester: String,
        dependency: String,
        constraint: String,
        found: String,
    },

    #[error("Extension '{requester}' requires '{dependency}', which is neither enabled nor part of the request")]
    DependencyNotEnabled { requester: String, dependency: String },

    #[error("Unknown extension: {name}")]
    UnknownExtension { name: String },

    #[error("Extension '{name}' is declared more than once")]
    DuplicateExtension { name: String },

    #[error("Module list is inconsistent: '{name}' requires '{missing}', which is not in the list")]
    InconsistentModuleList { name: String, missing: String },

    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("Extension source error: {message}")]
    Source { message: String },
}

/// Shorthand for results of extension system operations
pub type Result<T> = std::result::Result<T, ExtensionSystemError>;
