use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::registry::RegistryConfig;
use crate::storage::error::StorageSystemError;

type Result<T> = std::result::Result<T, StorageSystemError>;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    fn require(path: &Path) -> Result<Self> {
        Self::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))
    }

    /// Serialize a document to a string in this format
    pub fn serialize<T: Serialize>(&self, document: &T) -> Result<String> {
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(document)
                .map_err(|e| StorageSystemError::serialization("JSON", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(document)
                .map_err(|e| StorageSystemError::serialization("YAML", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(document)
                .map_err(|e| StorageSystemError::serialization("TOML", e)),
        }
    }

    /// Deserialize a document from a string in this format
    pub fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| StorageSystemError::deserialization("JSON", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| StorageSystemError::deserialization("YAML", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| StorageSystemError::deserialization("TOML", e)),
        }
    }
}

/// Load a document, choosing the format from the file extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ConfigFormat::require(path)?;
    if !path.exists() {
        return Err(StorageSystemError::FileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| StorageSystemError::io(e, "read_to_string", path.to_path_buf()))?;
    debug!("Loaded {} document from {}", format.extension(), path.display());
    format.deserialize(&content)
}

/// Save a document, creating parent directories as needed.
pub fn save_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let format = ConfigFormat::require(path)?;
    let content = format.serialize(document)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| StorageSystemError::io(e, "create_dir_all", parent.to_path_buf()))?;
    }
    fs::write(path, content).map_err(|e| StorageSystemError::io(e, "write", path.to_path_buf()))?;
    debug!("Saved {} document to {}", format.extension(), path.display());
    Ok(())
}

/// A site manifest: declared extensions plus the registry seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteManifest {
    /// Active installation profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Extensions enabled at startup
    #[serde(default)]
    pub initial: Vec<String>,

    /// Weight overrides
    #[serde(default)]
    pub weights: BTreeMap<String, i32>,

    /// Declared extensions
    #[serde(default)]
    pub extensions: Vec<ExtensionInfo>,
}

impl SiteManifest {
    /// Load a manifest from a json, yaml or toml file
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_document(path, self)
    }

    /// Registry seed described by this manifest
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            initial: self.initial.clone(),
            profile: self.profile.clone(),
            weights: self.weights.clone(),
        }
    }
}
