// Shared download and archive helpers for language backends

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tar::Archive;
use tracing::debug;

use super::traits::PluginError;

// Downloads are blocking; an explicit timeout keeps a dead mirror from
// hanging the invocation forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

fn get(url: &str) -> Result<Response, PluginError> {
    debug!(url, "fetching");
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("kver/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PluginError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().map_err(|e| PluginError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(PluginError::Download {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }
    Ok(response)
}

/// Fetch and deserialize a JSON document
pub fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, PluginError> {
    let response = get(url)?;
    let body = response.text().map_err(|e| PluginError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| PluginError::Download {
        url: url.to_string(),
        reason: format!("invalid response body: {e}"),
    })
}

/// Download a URL to a file, staging through a `.tmp` sibling so a truncated
/// transfer never lands at the final path
pub fn download_to(url: &str, dest: &Path) -> Result<(), PluginError> {
    let mut response = get(url)?;
    let temp_path = dest.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    io::copy(&mut response, &mut file).map_err(|e| PluginError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    fs::rename(&temp_path, dest)?;
    Ok(())
}

/// Extract a `.tar.gz` archive into a directory
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<(), PluginError> {
    debug!(
        archive = %archive_path.display(),
        dest = %dest.display(),
        "extracting"
    );
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(io::BufReader::new(file));
    let mut archive = Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|e| PluginError::Extract {
            path: archive_path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Hoist the contents of a sole top-level directory
///
/// Release tarballs unpack to a single root like `go/` or
/// `node-v22.1.0-linux-x64/`; the install directory wants that root's
/// contents directly, so `<dir>/bin` is the binaries.
pub fn flatten_single_root(dir: &Path) -> Result<(), PluginError> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() != 1 {
        return Ok(());
    }
    let Some(root) = entries.pop() else {
        return Ok(());
    };
    let root = root.path();
    if !root.is_dir() {
        return Ok(());
    }

    for child in fs::read_dir(&root)? {
        let child = child?;
        fs::rename(child.path(), dir.join(child.file_name()))?;
    }
    fs::remove_dir(&root)?;
    Ok(())
}
