//! # Modula Kernel Errors
//!
//! Defines [`Error`], the top-level error of `modula-core`. Subsystem errors
//! convert into it with `?`.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::extension_system::error::ExtensionSystemError;
use crate::storage::error::StorageSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Typed extension system error
    #[error("Extension system error: {0}")]
    ExtensionSystem(#[from] ExtensionSystemError),

    /// Typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Error occurring during a component lifecycle phase
    #[error("Component '{component}' failed during {phase}: {message}")]
    ComponentLifecycle {
        component: &'static str,
        phase: LifecyclePhase,
        message: String,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Phase of a kernel component's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum LifecyclePhase {
    #[error("Initialize")]
    Initialize,
    #[error("Start")]
    Start,
    #[error("Stop")]
    Stop,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// The extension system error behind this error, if any
    pub fn as_extension_error(&self) -> Option<&ExtensionSystemError> {
        match self {
            Error::ExtensionSystem(e) => Some(e),
            _ => None,
        }
    }
}
