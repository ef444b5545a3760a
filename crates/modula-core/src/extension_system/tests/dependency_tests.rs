#![cfg(test)]

use std::str::FromStr;

use crate::extension_system::dependency::{DependencyParseError, ExtensionDependency};
use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::version::VersionRange;

#[test]
fn test_dependency_constructors() {
    let vr = VersionRange::from_str("^1.0").unwrap();

    let ranged = ExtensionDependency::new("core", vr.clone());
    assert_eq!(ranged.name, "core");
    assert_eq!(ranged.version_range, Some(vr));

    let any = ExtensionDependency::any("utils");
    assert_eq!(any.name, "utils");
    assert!(any.version_range.is_none());
}

#[test]
fn test_parse_plain_name() {
    let dep = ExtensionDependency::parse("help").unwrap();
    assert_eq!(dep, ExtensionDependency::any("help"));
}

#[test]
fn test_parse_namespaced_with_constraint() {
    let dep = ExtensionDependency::parse("drupal:help (>=8.x-1.0)").unwrap();
    assert_eq!(dep.name, "help");
    let range = dep.version_range.as_ref().unwrap();
    assert_eq!(range.constraint_string(), ">=8.x-1.0");
    assert!(dep.is_compatible_with("1.0"));
    assert!(!dep.is_compatible_with("0.5"));
}

#[test]
fn test_parse_multiple_comparators() {
    let dep = ExtensionDependency::from_str("views (>=1.0, <2.0)").unwrap();
    assert!(dep.is_compatible_with("1.4"));
    assert!(!dep.is_compatible_with("2.0"));
}

#[test]
fn test_parse_errors() {
    assert_eq!(ExtensionDependency::parse("   "), Err(DependencyParseError::Empty));
    assert!(matches!(
        ExtensionDependency::parse("help ("),
        Err(DependencyParseError::Malformed(_))
    ));
    assert!(matches!(
        ExtensionDependency::parse("help ()"),
        Err(DependencyParseError::Malformed(_))
    ));
    assert!(matches!(
        ExtensionDependency::parse("two words"),
        Err(DependencyParseError::Malformed(_))
    ));
    assert!(matches!(
        ExtensionDependency::parse("help (>=abc)"),
        Err(DependencyParseError::Version(_))
    ));
}

#[test]
fn test_is_compatible_without_range() {
    let dep = ExtensionDependency::any("anything");
    assert!(dep.is_compatible_with("1.0.0"));
    assert!(dep.is_compatible_with("not-a-version"));
}

#[test]
fn test_is_compatible_unparsable_version() {
    let dep = ExtensionDependency::parse("help (>=1.0)").unwrap();
    assert!(!dep.is_compatible_with("abc"));
    assert!(!dep.is_compatible_with(""));
}

#[test]
fn test_dependency_display_format() {
    let dep = ExtensionDependency::parse("drupal:help (>=1.0)").unwrap();
    assert_eq!(dep.to_string(), "help (>=1.0)");
    assert_eq!(ExtensionDependency::any("help").to_string(), "help");
}

#[test]
fn test_info_deserializes_dependency_strings() {
    let json = r#"{
        "name": "config",
        "version": "8.x-1.3",
        "requires": ["help (>=1.0)", "system"],
        "weight": 5
    }"#;
    let info: ExtensionInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.name, "config");
    assert_eq!(info.weight, 5);
    assert!(!info.enabled);
    assert_eq!(info.dependency_names().collect::<Vec<_>>(), vec!["help", "system"]);
    assert!(info.requires_extension("system"));
    assert!(!info.requires_extension("color"));
    assert_eq!(info.semver().unwrap().unwrap(), semver::Version::new(1, 3, 0));
}

#[test]
fn test_dependency_with_prerelease_constraint() {
    let dep = ExtensionDependency::parse("help (>=8.x-1.0-beta1)").unwrap();
    assert_eq!(dep.name, "help");
    assert_eq!(
        dep.version_range.as_ref().map(|r| r.constraint_string()),
        Some(">=8.x-1.0-beta1")
    );
    assert!(dep.is_compatible_with("8.x-1.0-rc1"));
    assert!(dep.is_compatible_with("1.0"));
    assert!(!dep.is_compatible_with("1.0-alpha2"));
}

#[test]
fn test_info_builder() {
    let info = ExtensionInfo::builder("color")
        .version("1.0")
        .requires("config")
        .dependency("help", Some(VersionRange::from_str(">=1.0").unwrap()))
        .weight(-3)
        .description("Colour schemes")
        .package("Core")
        .build();
    assert_eq!(info.version.as_deref(), Some("1.0"));
    assert_eq!(info.requires.len(), 2);
    assert_eq!(info.requires[1].to_string(), "help (>=1.0)");
    assert_eq!(info.weight, -3);
    assert_eq!(info.package.as_deref(), Some("Core"));
    assert!(ExtensionInfo::new("bare").semver().is_none());
}
