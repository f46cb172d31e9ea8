// Go language backend: prebuilt toolchain tarballs from go.dev

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::activation::ActivationFragment;

use super::fetch;
use super::traits::{Plugin, PluginError};

const DOWNLOAD_BASE: &str = "https://go.dev/dl";
const RELEASE_INDEX: &str = "https://go.dev/dl/?mode=json&include=all";

#[derive(Debug, Clone)]
pub struct GoPlugin;

impl GoPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry in the go.dev release index
#[derive(Debug, Deserialize)]
struct GoRelease {
    version: String,
}

fn platform() -> Result<(&'static str, &'static str), PluginError> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        other => {
            return Err(PluginError::UnsupportedPlatform {
                os: other.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            })
        }
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => {
            return Err(PluginError::UnsupportedPlatform {
                os: os.to_string(),
                arch: other.to_string(),
            })
        }
    };
    Ok((os, arch))
}

fn archive_name(version: &str, os: &str, arch: &str) -> String {
    format!("go{version}.{os}-{arch}.tar.gz")
}

impl Plugin for GoPlugin {
    fn name(&self) -> &'static str {
        "go"
    }

    fn install(&self, version: &str, dest: &Path) -> Result<(), PluginError> {
        let (os, arch) = platform()?;
        let url = format!("{DOWNLOAD_BASE}/{}", archive_name(version, os, arch));
        info!(version = %version, url = %url, "downloading go toolchain");

        let scratch = tempfile::tempdir()?;
        let archive = scratch.path().join("go.tar.gz");
        fetch::download_to(&url, &archive)?;
        fetch::extract_tar_gz(&archive, dest)?;
        // the tarball unpacks to a top-level go/ directory
        fetch::flatten_single_root(dest)?;
        Ok(())
    }

    fn list_remote(&self) -> Result<Vec<String>, PluginError> {
        let releases: Vec<GoRelease> = fetch::get_json(RELEASE_INDEX)?;
        let mut versions: Vec<String> = releases
            .into_iter()
            .filter_map(|release| {
                release
                    .version
                    .strip_prefix("go")
                    .map(|version| version.to_string())
            })
            .collect();
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    fn activation_fragment(&self, _version: &str, install_dir: &Path) -> ActivationFragment {
        ActivationFragment::path_prepend(install_dir.join("bin"))
            .with_var("GOROOT", install_dir.display().to_string())
    }
}
