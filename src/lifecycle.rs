// Install/uninstall orchestration over the version store
//
// The lifecycle manager exclusively owns mutation of the store's
// `languages/` tree. Its one hard guarantee: an install directory either
// exists complete or does not exist at all, even when a backend fails
// after partial writes.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::activation;
use crate::error::{KverError, Result, StoreError};
use crate::language::PluginRegistry;
use crate::store::{PinFile, VersionStore};

pub struct LifecycleManager<'a> {
    registry: &'a PluginRegistry,
    store: &'a VersionStore,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(registry: &'a PluginRegistry, store: &'a VersionStore) -> Self {
        Self { registry, store }
    }

    /// Install a language version atomically
    ///
    /// The backend materializes into a staging directory under the store
    /// root; only a successful materialization is published into
    /// `languages/` with a single rename. A failing backend leaves nothing
    /// behind: the staging directory is removed when it goes out of scope
    /// and the final path was never created.
    pub fn install(&self, language: &str, version: &str) -> Result<()> {
        let plugin = self.registry.lookup(language)?;
        if self.store.is_installed(language, version) {
            return Err(KverError::AlreadyInstalled {
                language: language.to_string(),
                version: version.to_string(),
            });
        }

        let staging = self.store.staging_dir(language)?;
        debug!(
            language = %language,
            version = %version,
            staging = %staging.path().display(),
            "materializing into staging directory"
        );
        plugin
            .install(version, staging.path())
            .map_err(|source| KverError::Install {
                language: language.to_string(),
                version: version.to_string(),
                source,
            })?;

        let dest = self.store.install_dir(language, version);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("failed to create install directory", parent, e))?;
        }
        fs::rename(staging.path(), &dest)
            .map_err(|e| StoreError::io("failed to publish install directory", &dest, e))?;

        info!(language = %language, version = %version, "installed");
        Ok(())
    }

    /// Remove an installed version
    ///
    /// Deletes the install directory and any activation fragment pointing at
    /// it. A global selection referencing the removed version is deliberately
    /// left in place: it becomes a dangling reference the resolver reports as
    /// "not set", rather than configuration silently disappearing.
    pub fn uninstall(&self, language: &str, version: &str) -> Result<()> {
        let plugin = self.registry.lookup(language)?;
        let install_dir = self.store.install_dir(language, version);
        if !install_dir.is_dir() {
            return Err(KverError::NotInstalled {
                language: language.to_string(),
                version: version.to_string(),
            });
        }

        plugin
            .pre_uninstall(version, &install_dir)
            .map_err(|source| KverError::Uninstall {
                language: language.to_string(),
                version: version.to_string(),
                source,
            })?;

        activation::remove_fragment_referencing(self.store, language, &install_dir)?;
        fs::remove_dir_all(&install_dir)
            .map_err(|e| StoreError::io("failed to remove install directory", &install_dir, e))?;

        info!(language = %language, version = %version, "uninstalled");
        Ok(())
    }

    /// Set the machine-wide default version for a language
    pub fn set_global(&self, language: &str, version: &str) -> Result<()> {
        self.registry.lookup(language)?;
        self.require_installed(language, version)?;
        self.store.set_global_selection(language, version)?;
        info!(language = %language, version = %version, "global selection updated");
        Ok(())
    }

    /// Pin a language version for a project directory
    ///
    /// Updates the existing `.kver` entry in place; a global default is not
    /// required to exist.
    pub fn set_local(&self, language: &str, version: &str, project_dir: &Path) -> Result<()> {
        self.registry.lookup(language)?;
        self.require_installed(language, version)?;
        let mut pins = PinFile::load(project_dir)?;
        pins.set(language, version);
        pins.save()?;
        info!(
            language = %language,
            version = %version,
            project = %project_dir.display(),
            "local pin updated"
        );
        Ok(())
    }

    fn require_installed(&self, language: &str, version: &str) -> Result<()> {
        if self.store.is_installed(language, version) {
            Ok(())
        } else {
            Err(KverError::NotInstalled {
                language: language.to_string(),
                version: version.to_string(),
            })
        }
    }
}
