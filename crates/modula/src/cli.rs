use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use modula_core::extension_system::{
    DefaultExtensionManager, ExtensionManager, ExtensionSystemError, InstallOptions, ManifestSource, RegistryState,
    UninstallOptions,
};
use modula_core::kernel::component::KernelComponent;
use modula_core::kernel::constants;
use modula_core::kernel::error::Result;
use modula_core::storage::{SiteManifest, load_document, save_document};

use crate::{Commands, PlanCommand};

/// A site opened from its manifest and, when present, its persisted state.
struct Site {
    manager: DefaultExtensionManager,
    state_path: PathBuf,
}

fn default_state_path(manifest: &Path) -> PathBuf {
    manifest
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(constants::DEFAULT_STATE_FILE)
}

impl Site {
    async fn open(manifest_path: &Path, state_path: Option<&Path>) -> Result<Self> {
        let manifest = SiteManifest::load(manifest_path)?;
        let state_path = state_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_state_path(manifest_path));

        let config = if state_path.exists() {
            info!("Restoring registry state from {}", state_path.display());
            let state: RegistryState = load_document(&state_path)?;
            state.into_config(manifest.profile.clone())
        } else {
            manifest.registry_config()
        };

        let source = Arc::new(ManifestSource::new(manifest_path));
        let manager = DefaultExtensionManager::new(source, config)?;
        manager.initialize().await?;
        Ok(Self { manager, state_path })
    }

    async fn persist(&self) -> Result<()> {
        let state = self.manager.snapshot().await?;
        save_document(&self.state_path, &state)?;
        info!("Registry state written to {}", self.state_path.display());
        Ok(())
    }
}

fn install_options(no_dependencies: bool) -> InstallOptions {
    InstallOptions {
        enable_dependencies: !no_dependencies,
    }
}

fn uninstall_options(with_dependents: bool) -> UninstallOptions {
    UninstallOptions {
        uninstall_dependents: with_dependents,
    }
}

fn print_plan(plan: &[String]) {
    if plan.is_empty() {
        println!("Nothing to do");
    }
    for (step, name) in plan.iter().enumerate() {
        println!("{}. {}", step + 1, name);
    }
}

/// Execute one command against the site described by `manifest`.
pub async fn run(manifest: &Path, state: Option<&Path>, command: Commands) -> Result<()> {
    let site = Site::open(manifest, state).await?;
    let manager = &site.manager;

    match command {
        Commands::List { all } => {
            for name in manager.list_enabled().await? {
                println!("{}", name);
            }
            if all {
                let registry = manager.registry().read().await;
                for info in registry.known_extensions().into_iter().filter(|info| !info.enabled) {
                    println!("{} (disabled)", info.name);
                }
            }
        }
        Commands::Info { name } => {
            let Some(info) = manager.get_extension(&name).await? else {
                return Err(ExtensionSystemError::UnknownExtension { name }.into());
            };
            println!("name: {}", info.name);
            println!("version: {}", info.version.as_deref().unwrap_or("-"));
            println!("enabled: {}", info.enabled);
            println!("weight: {}", info.weight);
            let requires: Vec<String> = info.requires.iter().map(ToString::to_string).collect();
            println!("requires: {}", requires.join(", "));
            let dependents = manager.get_dependent_extensions(&name).await?;
            println!("required by: {}", dependents.join(", "));
            if let Some(description) = &info.description {
                println!("description: {}", description);
            }
        }
        Commands::Install { names, no_dependencies } => {
            let applied = manager.install_with(&names, install_options(no_dependencies)).await?;
            site.persist().await?;
            println!("Installed: {}", applied.join(", "));
        }
        Commands::Uninstall { names, with_dependents } => {
            let applied = manager.uninstall_with(&names, uninstall_options(with_dependents)).await?;
            site.persist().await?;
            println!("Uninstalled: {}", applied.join(", "));
        }
        Commands::SetWeight { name, weight } => {
            manager.set_weight(&name, weight).await?;
            site.persist().await?;
            println!("Weight of '{}' set to {}", name, weight);
        }
        Commands::Plan { command } => {
            let plan = match command {
                PlanCommand::Install { names, no_dependencies } => {
                    manager.plan_install(&names, install_options(no_dependencies)).await?
                }
                PlanCommand::Uninstall { names, with_dependents } => {
                    manager.plan_uninstall(&names, uninstall_options(with_dependents)).await?
                }
            };
            print_plan(&plan);
        }
    }
    Ok(())
}
