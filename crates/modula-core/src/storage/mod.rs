//! # Modula Storage
//!
//! Loading and saving of site manifests and persisted registry state.
//! The file format follows the file extension: `json` always, `yaml`/`yml`
//! and `toml` behind the `yaml-config` and `toml-config` features.

pub mod config;
pub mod error;

pub use config::{ConfigFormat, SiteManifest, load_document, save_document};
pub use error::StorageSystemError;
