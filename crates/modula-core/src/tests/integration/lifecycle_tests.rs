//! End-to-end scenarios over a registry backed by an in-memory source.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::extension_system::{
    ExtensionInfo, ExtensionSystemError, HookError, Lifecycle, LifecycleRegistry, RegistryConfig,
    StaticExtensionSource,
};

/// Hooks writing into a shared journal, standing in for schema installation
#[derive(Default)]
struct Journal {
    entries: Mutex<Vec<String>>,
    broken: Option<String>,
}

impl Journal {
    fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl Lifecycle for Journal {
    fn on_install(&self, name: &str) -> Result<(), HookError> {
        if self.broken.as_deref() == Some(name) {
            return Err("schema creation failed".into());
        }
        self.entries.lock().unwrap().push(format!("+{}", name));
        Ok(())
    }

    fn on_uninstall(&self, name: &str) -> Result<(), HookError> {
        self.entries.lock().unwrap().push(format!("-{}", name));
        Ok(())
    }
}

fn site(extensions: Vec<ExtensionInfo>, journal: Arc<Journal>, config: RegistryConfig) -> LifecycleRegistry {
    let source = StaticExtensionSource::from_extensions(extensions).with_default_lifecycle(journal);
    LifecycleRegistry::new(Arc::new(source), config).unwrap()
}

fn chain() -> Vec<ExtensionInfo> {
    vec![
        ExtensionInfo::builder("help").build(),
        ExtensionInfo::builder("config").requires("help").build(),
        ExtensionInfo::builder("color").requires("config").build(),
    ]
}

#[test]
fn test_dependency_resolution_lifecycle() {
    let journal = Arc::new(Journal::default());
    let mut registry = site(chain(), journal.clone(), RegistryConfig::default());

    // Enabling the leaf pulls in the whole chain, dependencies first.
    assert_eq!(registry.install(&["color"]).unwrap(), vec!["help", "config", "color"]);
    assert_eq!(registry.list_enabled(), vec!["help", "config", "color"]);

    // A dependency cannot be removed while something still needs it.
    assert!(matches!(
        registry.uninstall(&["config"]),
        Err(ExtensionSystemError::DependentsStillEnabled { .. })
    ));

    assert_eq!(
        registry.uninstall(&["config", "help", "color"]).unwrap(),
        vec!["color", "config", "help"]
    );
    assert_eq!(
        journal.entries(),
        vec!["+help", "+config", "+color", "-color", "-config", "-help"]
    );
}

#[test]
fn test_missing_dependency_then_fixed() {
    let mut extensions = chain();
    extensions[1] = ExtensionInfo::builder("config").requires("help").requires("foo").build();
    let source = Arc::new(StaticExtensionSource::from_extensions(extensions));
    let mut registry = LifecycleRegistry::new(source.clone(), RegistryConfig::default()).unwrap();

    assert_eq!(
        registry.install(&["color"]).unwrap_err(),
        ExtensionSystemError::MissingDependency {
            requester: "config".to_string(),
            missing: "foo".to_string(),
        }
    );
    assert!(registry.list_enabled().is_empty());

    source.upsert(ExtensionInfo::new("foo")).unwrap();
    let applied = registry.install(&["color"]).unwrap();
    assert_eq!(applied.last().map(String::as_str), Some("color"));
    assert_eq!(applied.len(), 4);
}

#[test]
fn test_every_extension_follows_its_dependencies() {
    let extensions = vec![
        ExtensionInfo::builder("system").weight(-10).build(),
        ExtensionInfo::builder("user").requires("system").build(),
        ExtensionInfo::builder("node").requires("user").requires("filter").build(),
        ExtensionInfo::builder("filter").requires("system").weight(5).build(),
        ExtensionInfo::builder("comment").requires("node").requires("user").build(),
        ExtensionInfo::builder("ban").weight(-20).build(),
    ];
    let mut registry = site(extensions.clone(), Arc::new(Journal::default()), RegistryConfig::default());
    registry.install(&["comment", "ban"]).unwrap();

    let listed = registry.list_enabled();
    assert_eq!(listed.len(), extensions.len());
    let mut seen = HashSet::new();
    for name in &listed {
        let info = registry.enabled_info(name).unwrap();
        for dep in info.dependency_names() {
            assert!(seen.contains(dep), "{} listed before its dependency {}", name, dep);
        }
        seen.insert(name.as_str());
    }
    assert_eq!(listed.first().map(String::as_str), Some("ban"));
}

#[test]
fn test_cycle_leaves_state_unchanged() {
    let extensions = vec![
        ExtensionInfo::builder("a").requires("b").build(),
        ExtensionInfo::builder("b").requires("a").build(),
        ExtensionInfo::builder("help").build(),
    ];
    let config = RegistryConfig {
        initial: vec!["help".to_string()],
        ..RegistryConfig::default()
    };
    let journal = Arc::new(Journal::default());
    let mut registry = site(extensions, journal.clone(), config);

    match registry.install(&["a"]) {
        Err(ExtensionSystemError::CircularDependency { members }) => {
            let members: HashSet<String> = members.into_iter().collect();
            assert_eq!(members, HashSet::from(["a".to_string(), "b".to_string()]));
        }
        other => panic!("expected CircularDependency, got {:?}", other),
    }
    assert_eq!(registry.list_enabled(), vec!["help"]);
    assert!(journal.entries().is_empty());
}

#[test]
fn test_module_weights_reorder_listing() {
    let extensions = vec![ExtensionInfo::new("system"), ExtensionInfo::new("ban")];
    let config = RegistryConfig {
        initial: vec!["system".to_string(), "ban".to_string()],
        ..RegistryConfig::default()
    };
    let mut registry = site(extensions, Arc::new(Journal::default()), config);
    assert_eq!(registry.list_enabled(), vec!["ban", "system"]);

    registry.set_weight("ban", 20).unwrap();
    assert_eq!(registry.list_enabled(), vec!["system", "ban"]);

    registry.set_weight("ban", -1).unwrap();
    assert_eq!(registry.list_enabled(), vec!["ban", "system"]);
}

#[test]
fn test_version_dependency() {
    let extensions = vec![
        ExtensionInfo::builder("common_test").version("8.x-2.4").build(),
        ExtensionInfo::builder("dependent")
            .requirement("drupal:common_test (>2.0, <3.0)".parse().unwrap())
            .build(),
        ExtensionInfo::builder("too_new")
            .requirement("common_test (>=8.x-3.0)".parse().unwrap())
            .build(),
    ];
    let mut registry = site(extensions, Arc::new(Journal::default()), RegistryConfig::default());

    assert!(matches!(
        registry.install(&["too_new"]),
        Err(ExtensionSystemError::IncompatibleVersion { .. })
    ));
    assert!(registry.list_enabled().is_empty());

    assert_eq!(registry.install(&["dependent"]).unwrap(), vec!["common_test", "dependent"]);
}

#[test]
fn test_failed_hook_rolls_back_whole_call() {
    let journal = Arc::new(Journal {
        broken: Some("color".to_string()),
        ..Journal::default()
    });
    let mut registry = site(chain(), journal.clone(), RegistryConfig::default());

    match registry.install(&["color"]) {
        Err(ExtensionSystemError::HookFailure { name, rolled_back, .. }) => {
            assert_eq!(name, "color");
            assert_eq!(rolled_back, vec!["config", "help"]);
        }
        other => panic!("expected HookFailure, got {:?}", other),
    }
    assert_eq!(journal.entries(), vec!["+help", "+config", "-config", "-help"]);
    assert!(registry.list_enabled().is_empty());

    // The untouched part of the chain still installs.
    assert_eq!(registry.install(&["config"]).unwrap(), vec!["help", "config"]);
}

#[test]
fn test_uninstall_profile_dependency() {
    let extensions = vec![
        ExtensionInfo::new("dblog"),
        ExtensionInfo::new("ban"),
        ExtensionInfo::builder("testing").requires("dblog").build(),
    ];
    let config = RegistryConfig {
        initial: vec!["dblog".to_string(), "ban".to_string()],
        profile: Some("testing".to_string()),
        ..RegistryConfig::default()
    };
    let mut registry = site(extensions, Arc::new(Journal::default()), config);
    assert!(registry.is_enabled("testing"));

    registry.uninstall(&["dblog"]).unwrap();
    assert!(!registry.is_enabled("dblog"));
    assert!(registry.is_enabled("testing"));
    assert_eq!(registry.list_enabled(), vec!["ban", "testing"]);

    // The profile itself is an ordinary uninstall when asked for.
    registry.uninstall(&["testing"]).unwrap();
    assert_eq!(registry.list_enabled(), vec!["ban"]);
}

#[test]
fn test_fixed_module_list() {
    let mut registry = site(chain(), Arc::new(Journal::default()), RegistryConfig::default());
    registry.set_module_list(&["help", "config"]).unwrap();
    assert_eq!(registry.list_enabled(), vec!["help", "config"]);

    registry.install(&["color"]).unwrap();
    registry.set_module_list(&["help"]).unwrap();
    assert_eq!(registry.list_enabled(), vec!["help"]);
    assert!(registry.enabled_info("color").is_none());
}
