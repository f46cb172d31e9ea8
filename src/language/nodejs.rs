// Node.js language backend: prebuilt tarballs from nodejs.org

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::fetch;
use super::traits::{Plugin, PluginError};

const DOWNLOAD_BASE: &str = "https://nodejs.org/dist";
const RELEASE_INDEX: &str = "https://nodejs.org/dist/index.json";

#[derive(Debug, Clone)]
pub struct NodejsPlugin;

impl NodejsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NodejsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry in the nodejs.org release index
#[derive(Debug, Deserialize)]
struct NodeRelease {
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
        "x86_64" => "x64",
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
    format!("node-v{version}-{os}-{arch}.tar.gz")
}

impl Plugin for NodejsPlugin {
    fn name(&self) -> &'static str {
        "nodejs"
    }

    fn install(&self, version: &str, dest: &Path) -> Result<(), PluginError> {
        let (os, arch) = platform()?;
        let name = archive_name(version, os, arch);
        let url = format!("{DOWNLOAD_BASE}/v{version}/{name}");
        info!(version = %version, url = %url, "downloading node runtime");

        let scratch = tempfile::tempdir()?;
        let archive = scratch.path().join(name);
        fetch::download_to(&url, &archive)?;
        fetch::extract_tar_gz(&archive, dest)?;
        // the tarball unpacks to node-v<version>-<os>-<arch>/
        fetch::flatten_single_root(dest)?;
        Ok(())
    }

    fn list_remote(&self) -> Result<Vec<String>, PluginError> {
        let releases: Vec<NodeRelease> = fetch::get_json(RELEASE_INDEX)?;
        let mut versions: Vec<String> = releases
            .into_iter()
            .map(|release| {
                release
                    .version
                    .strip_prefix('v')
                    .unwrap_or(&release.version)
                    .to_string()
            })
            .collect();
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    // activation uses the generic PATH prepend: node's layout is bin/ under
    // the install directory and no extra variables are needed
}
