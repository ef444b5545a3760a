use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::extension_system::version::{VersionError, VersionRange};

/// Represents a dependency on another extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDependency {
    /// The name of the required extension
    pub name: String,

    /// The version range that is acceptable
    pub version_range: Option<VersionRange>,
}

/// Error that can occur when parsing a declared dependency string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyParseError {
    #[error("Dependency declaration is empty")]
    Empty,

    #[error("Malformed dependency declaration: '{0}'")]
    Malformed(String),

    #[error("Invalid version constraint in dependency: {0}")]
    Version(#[from] VersionError),
}

impl ExtensionDependency {
    /// Create a new dependency with a specific version range
    pub fn new(name: &str, version_range: VersionRange) -> Self {
        Self {
            name: name.to_string(),
            version_range: Some(version_range),
        }
    }

    /// Create a new dependency with any version
    pub fn any(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version_range: None,
        }
    }

    /// Parses a declaration of the form `name`, `name (>=1.0)` or
    /// `project:name (>=8.x-1.0, <2.0)`.
    pub fn parse(declaration: &str) -> Result<Self, DependencyParseError> {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            return Err(DependencyParseError::Empty);
        }

        let (head, constraint) = match declaration.find('(') {
            Some(open) => {
                let rest = &declaration[open + 1..];
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| DependencyParseError::Malformed(declaration.to_string()))?;
                (&declaration[..open], Some(inner.trim()))
            }
            None => (declaration, None),
        };

        // A `project:` namespace is informational only.
        let head = head.trim();
        let name = head.rsplit(':').next().unwrap_or(head).trim();
        if name.is_empty() || name.contains(char::is_whitespace) || name.contains(')') {
            return Err(DependencyParseError::Malformed(declaration.to_string()));
        }

        let version_range = match constraint {
            Some("") => return Err(DependencyParseError::Malformed(declaration.to_string())),
            Some(constraint) => Some(VersionRange::from_constraint(constraint)?),
            None => None,
        };

        Ok(Self {
            name: name.to_string(),
            version_range,
        })
    }

    /// Check if this dependency is compatible with the given extension version string
    pub fn is_compatible_with(&self, version_str: &str) -> bool {
        match &self.version_range {
            Some(range) => match range.includes_str(version_str) {
                Ok(included) => included,
                Err(e) => {
                    warn!(
                        "Could not parse version string '{}' for compatibility check with extension '{}': {}",
                        version_str, self.name, e
                    );
                    false
                }
            },
            // No version range means any version is acceptable
            None => true,
        }
    }
}

impl fmt::Display for ExtensionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_range {
            Some(range) => write!(f, "{} ({})", self.name, range.constraint_string()),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for ExtensionDependency {
    type Err = DependencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtensionDependency::parse(s)
    }
}

impl Serialize for ExtensionDependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExtensionDependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ExtensionDependency::parse(&raw).map_err(serde::de::Error::custom)
    }
}
