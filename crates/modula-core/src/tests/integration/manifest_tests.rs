use std::sync::Arc;

use tempfile::tempdir;

use crate::extension_system::{
    DefaultExtensionManager, ExtensionManager, ManifestSource, RegistryState,
};
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result;
use crate::storage::{SiteManifest, load_document, save_document};

const MANIFEST: &str = r#"{
    "profile": "standard",
    "initial": ["system"],
    "extensions": [
        {"name": "system", "version": "8.x-1.0", "weight": -10},
        {"name": "help", "requires": ["drupal:system"]},
        {"name": "config", "requires": ["help (>=0)"]},
        {"name": "standard", "requires": ["system"]}
    ]
}"#;

#[tokio::test]
async fn test_manifest_driven_site_persists_state() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp directory");
    let manifest_path = dir.path().join("site.json");
    let state_path = dir.path().join("state").join("modula-state.json");
    std::fs::write(&manifest_path, MANIFEST).expect("Failed to write manifest");

    let manifest = SiteManifest::load(&manifest_path)?;
    let source = Arc::new(ManifestSource::new(&manifest_path));
    let manager = DefaultExtensionManager::new(source.clone(), manifest.registry_config())?;
    manager.initialize().await?;
    assert_eq!(manager.list_enabled().await?, vec!["system", "standard"]);

    // config requires a version of help, which declares none.
    assert!(manager.install(&["config".to_string()]).await.is_err());
    manager.install(&["help".to_string()]).await?;
    manager.set_weight("help", 7).await?;
    save_document(&state_path, &manager.snapshot().await?)?;

    let state: RegistryState = load_document(&state_path)?;
    assert_eq!(state.enabled, vec!["system", "standard", "help"]);

    let restored = DefaultExtensionManager::new(source, state.into_config(manifest.profile.clone()))?;
    assert_eq!(restored.list_enabled().await?, vec!["system", "standard", "help"]);
    assert!(restored.is_enabled("standard").await?);
    Ok(())
}
