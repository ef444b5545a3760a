//! # Modula Core Kernel
//!
//! Shared plumbing of `modula-core`: the [`KernelComponent`] lifecycle
//! trait, application constants, and the top-level [`Error`] type that wraps
//! every subsystem error.
pub mod component;
pub mod constants;
pub mod error;

pub use component::KernelComponent;
pub use error::{Error, LifecyclePhase, Result};
