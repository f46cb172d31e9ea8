// Core Plugin trait definition for the kver language backend architecture

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::activation::ActivationFragment;

/// Contract every language backend must satisfy
///
/// A backend knows how to materialize a named version's files and what shell
/// environment makes those files usable. Store layout, version selection and
/// install atomicity belong to the core and are identical for every language.
pub trait Plugin: Send + Sync {
    /// Language identification; must match the name used on the command line
    fn name(&self) -> &'static str;

    /// Materialize the files of `version` under `dest`
    ///
    /// `dest` is a staging directory owned by the lifecycle manager; the
    /// backend writes only beneath it and never touches the final install
    /// location. All-or-nothing publication is enforced by the caller.
    fn install(&self, version: &str, dest: &Path) -> Result<(), PluginError>;

    /// Backend-specific cleanup before an install directory is removed
    fn pre_uninstall(&self, _version: &str, _install_dir: &Path) -> Result<(), PluginError> {
        Ok(())
    }

    /// Versions available upstream, lexically sorted for display
    ///
    /// Failures here must not touch local state; they only propagate.
    fn list_remote(&self) -> Result<Vec<String>, PluginError>;

    /// Environment mutation that exposes an installed version's binaries
    ///
    /// Backends without special requirements inherit the generic
    /// "prepend `<install-dir>/bin` to PATH" behavior.
    fn activation_fragment(&self, _version: &str, install_dir: &Path) -> ActivationFragment {
        ActivationFragment::path_prepend(install_dir.join("bin"))
    }
}

/// Language backend errors, opaque to the core beyond "which phase failed"
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("extraction failed: {path}: {reason}")]
    Extract { path: PathBuf, reason: String },

    #[error("build failed: {reason}")]
    Build { reason: String },

    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}
