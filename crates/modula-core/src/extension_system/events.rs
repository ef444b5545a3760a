use std::fmt;

/// Changes committed by the lifecycle registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Extensions were installed, in application order
    Installed { names: Vec<String> },
    /// Extensions were uninstalled, in application order
    Uninstalled { names: Vec<String> },
    /// The weight of an extension changed
    WeightChanged { name: String, weight: i32 },
    /// The enabled set was replaced without running hooks
    ModuleListReplaced { names: Vec<String> },
}

impl LifecycleEvent {
    /// Get the name of this event
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Installed { .. } => "extension.installed",
            LifecycleEvent::Uninstalled { .. } => "extension.uninstalled",
            LifecycleEvent::WeightChanged { .. } => "extension.weight_changed",
            LifecycleEvent::ModuleListReplaced { .. } => "extension.module_list_replaced",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Installed { names }
            | LifecycleEvent::Uninstalled { names }
            | LifecycleEvent::ModuleListReplaced { names } => {
                write!(f, "{}: [{}]", self.name(), names.join(", "))
            }
            LifecycleEvent::WeightChanged { name, weight } => {
                write!(f, "{}: {} = {}", self.name(), name, weight)
            }
        }
    }
}

/// Receives committed changes, e.g. to persist the enabled set.
///
/// Observers are only notified after a call succeeded; rolled back calls
/// produce no event.
pub trait LifecycleObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent);
}
