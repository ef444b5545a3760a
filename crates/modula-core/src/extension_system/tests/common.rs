#![cfg(test)]

use std::sync::{Arc, Mutex};

use crate::extension_system::events::{LifecycleEvent, LifecycleObserver};
use crate::extension_system::info::ExtensionInfo;
use crate::extension_system::traits::{HookError, Lifecycle};

/// Shorthand for a descriptor requiring `requires` with no version
pub fn ext(name: &str, requires: &[&str]) -> ExtensionInfo {
    requires
        .iter()
        .fold(ExtensionInfo::builder(name), |builder, dep| builder.requires(dep))
        .build()
}

/// Descriptor with a weight
pub fn weighted(name: &str, weight: i32) -> ExtensionInfo {
    ExtensionInfo::builder(name).weight(weight).build()
}

/// The help <- config <- color chain
pub fn help_config_color() -> Vec<ExtensionInfo> {
    vec![
        ext("help", &[]),
        ext("config", &["help"]),
        ext("color", &["config"]),
    ]
}

/// Hooks that record every call and can be told to fail for one name
#[derive(Debug, Default)]
pub struct RecordingLifecycle {
    calls: Mutex<Vec<String>>,
    fail_install: Option<String>,
    fail_uninstall: Option<String>,
}

impl RecordingLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_install(name: &str) -> Self {
        Self {
            fail_install: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_uninstall(name: &str) -> Self {
        Self {
            fail_uninstall: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Calls as `install:<name>` / `uninstall:<name>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Lifecycle for RecordingLifecycle {
    fn on_install(&self, name: &str) -> Result<(), HookError> {
        self.calls.lock().unwrap().push(format!("install:{}", name));
        if self.fail_install.as_deref() == Some(name) {
            return Err(HookError::new(format!("{} refused to install", name)));
        }
        Ok(())
    }

    fn on_uninstall(&self, name: &str) -> Result<(), HookError> {
        self.calls.lock().unwrap().push(format!("uninstall:{}", name));
        if self.fail_uninstall.as_deref() == Some(name) {
            return Err(HookError::new(format!("{} refused to uninstall", name)));
        }
        Ok(())
    }
}

/// Observer collecting every event
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl CollectingObserver {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleObserver for CollectingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn recording() -> Arc<RecordingLifecycle> {
    Arc::new(RecordingLifecycle::new())
}
