use serde::{Deserialize, Serialize};

use crate::extension_system::dependency::ExtensionDependency;
use crate::extension_system::version::{self, VersionError, VersionRange};

/// Declared metadata of a single extension.
///
/// Instances are produced by an [`ExtensionSource`](crate::extension_system::ExtensionSource).
/// Only the lifecycle registry changes `weight` and `enabled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// Unique machine name
    pub name: String,

    /// Declared version, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Required extensions, in declaration order
    #[serde(default)]
    pub requires: Vec<ExtensionDependency>,

    /// Ordering weight for otherwise unconstrained extensions
    #[serde(default)]
    pub weight: i32,

    /// Whether the extension is currently enabled
    #[serde(skip)]
    pub enabled: bool,

    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Package grouping used for listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl ExtensionInfo {
    /// Create a new descriptor without version or dependencies
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
            requires: Vec::new(),
            weight: 0,
            enabled: false,
            description: None,
            package: None,
        }
    }

    /// Start building a descriptor
    pub fn builder(name: &str) -> InfoBuilder {
        InfoBuilder::new(name)
    }

    /// Add a dependency
    pub fn add_dependency(&mut self, name: &str, version_range: Option<VersionRange>) -> &mut Self {
        self.requires.push(ExtensionDependency {
            name: name.to_string(),
            version_range,
        });
        self
    }

    /// Names of the required extensions, in declaration order
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.requires.iter().map(|dep| dep.name.as_str())
    }

    /// Whether this extension declares a dependency on `name`
    pub fn requires_extension(&self, name: &str) -> bool {
        self.requires.iter().any(|dep| dep.name == name)
    }

    /// The declared version parsed as semver, if one is declared
    pub fn semver(&self) -> Option<Result<semver::Version, VersionError>> {
        self.version.as_deref().map(version::parse_version)
    }
}

/// Builder for creating an extension descriptor
pub struct InfoBuilder {
    info: ExtensionInfo,
}

impl InfoBuilder {
    /// Create a new builder
    pub fn new(name: &str) -> Self {
        Self {
            info: ExtensionInfo::new(name),
        }
    }

    /// Set the declared version
    pub fn version(mut self, version: &str) -> Self {
        self.info.version = Some(version.to_string());
        self
    }

    /// Add a dependency on any version of `name`
    pub fn requires(mut self, name: &str) -> Self {
        self.info.add_dependency(name, None);
        self
    }

    /// Add a dependency with an optional version range
    pub fn dependency(mut self, name: &str, version_range: Option<VersionRange>) -> Self {
        self.info.add_dependency(name, version_range);
        self
    }

    /// Add an already parsed dependency
    pub fn requirement(mut self, dependency: ExtensionDependency) -> Self {
        self.info.requires.push(dependency);
        self
    }

    /// Set the weight
    pub fn weight(mut self, weight: i32) -> Self {
        self.info.weight = weight;
        self
    }

    /// Set the description
    pub fn description(mut self, description: &str) -> Self {
        self.info.description = Some(description.to_string());
        self
    }

    /// Set the package
    pub fn package(mut self, package: &str) -> Self {
        self.info.package = Some(package.to_string());
        self
    }

    /// Build the descriptor
    pub fn build(self) -> ExtensionInfo {
        self.info
    }
}
