// Version store: on-disk layout conventions and the project pin file
//
// Layout under the store root (default ~/.kver):
//   languages/<language>/<version>/   installed version payload (plugin-owned)
//   versions/<language>               symlink to the active install directory
//   env.d/<language>.sh               persistent activation fragments
//   tmp/                              staging area for in-flight installs
//
// Existence of an install directory is the sole source of truth for
// "installed"; there is no separate manifest or index file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::StoreError;

/// Name of the per-project pin file
pub const PIN_FILE_NAME: &str = ".kver";

/// Environment variable overriding the store root (useful for tests)
pub const ROOT_ENV_VAR: &str = "KVER_ROOT";

/// Path conventions for the on-disk version store
///
/// The store is pure data layer: it knows where things live and how the
/// global-selection symlinks are encoded, nothing about how versions are
/// materialized. Mutation of the `languages/` tree goes through the
/// `LifecycleManager`; everything else only reads.
#[derive(Debug, Clone)]
pub struct VersionStore {
    root: PathBuf,
}

impl VersionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store at `$KVER_ROOT`, falling back to `~/.kver`
    pub fn from_env() -> Result<Self, StoreError> {
        if let Some(root) = std::env::var_os(ROOT_ENV_VAR) {
            return Ok(Self::new(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
        Ok(Self::new(home.join(".kver")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn languages_dir(&self) -> PathBuf {
        self.root.join("languages")
    }

    pub fn install_dir(&self, language: &str, version: &str) -> PathBuf {
        self.languages_dir().join(language).join(version)
    }

    pub fn is_installed(&self, language: &str, version: &str) -> bool {
        self.install_dir(language, version).is_dir()
    }

    /// Installed versions of a language, lexically sorted for display
    pub fn installed_versions(&self, language: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.languages_dir().join(language);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("failed to read language directory", dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StoreError::io("failed to read language directory", &dir, e))?;
            if entry.path().is_dir() {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        versions.sort();
        Ok(versions)
    }

    fn selections_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    fn selection_link(&self, language: &str) -> PathBuf {
        self.selections_dir().join(language)
    }

    /// Read the global selection for a language
    ///
    /// The selection is a symlink pointing at the install directory; its
    /// final path component is the version string. A dangling link still
    /// yields a version here — installed-ness is the resolver's concern.
    pub fn global_selection(&self, language: &str) -> Result<Option<String>, StoreError> {
        let link = self.selection_link(language);
        match fs::read_link(&link) {
            Ok(target) => Ok(target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("failed to read global selection", link, e)),
        }
    }

    /// Point the global selection symlink at an install directory
    pub fn set_global_selection(&self, language: &str, version: &str) -> Result<(), StoreError> {
        let dir = self.selections_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::io("failed to create selections directory", &dir, e))?;
        let link = self.selection_link(language);
        let target = self.install_dir(language, version);
        replace_symlink(&target, &link)
            .map_err(|e| StoreError::io("failed to update global selection", link, e))
    }

    /// Languages that currently have a global selection
    pub fn selected_languages(&self) -> Result<Vec<String>, StoreError> {
        let dir = self.selections_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::io("failed to read selections directory", dir, e));
            }
        };

        let mut languages = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StoreError::io("failed to read selections directory", &dir, e))?;
            languages.push(entry.file_name().to_string_lossy().into_owned());
        }
        languages.sort();
        Ok(languages)
    }

    pub fn activation_dir(&self) -> PathBuf {
        self.root.join("env.d")
    }

    pub fn activation_file(&self, language: &str) -> PathBuf {
        self.activation_dir().join(format!("{language}.sh"))
    }

    /// Create a staging directory for an in-flight install
    ///
    /// Staging lives under the store root so the final `fs::rename` into
    /// `languages/` stays on one filesystem.
    pub fn staging_dir(&self, language: &str) -> Result<TempDir, StoreError> {
        let tmp = self.root.join("tmp");
        fs::create_dir_all(&tmp)
            .map_err(|e| StoreError::io("failed to create staging directory", &tmp, e))?;
        tempfile::Builder::new()
            .prefix(&format!("{language}-install-"))
            .tempdir_in(&tmp)
            .map_err(|e| StoreError::io("failed to create staging directory", tmp, e))
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

fn replace_symlink(target: &Path, link: &Path) -> io::Result<()> {
    match fs::symlink_metadata(link) {
        Ok(_) => {
            #[cfg(unix)]
            fs::remove_file(link)?;
            #[cfg(windows)]
            fs::remove_dir(link)?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    make_symlink(target, link)
}

/// The `.kver` pin file of a project directory
///
/// One `language = version` assignment per line, order-insensitive,
/// last-write-wins on duplicate keys, human-editable. Updates rewrite the
/// existing entry instead of appending a duplicate.
#[derive(Debug, Clone)]
pub struct PinFile {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl PinFile {
    /// Load the pin file of a project directory; a missing file is empty
    pub fn load(project_dir: &Path) -> Result<Self, StoreError> {
        let path = project_dir.join(PIN_FILE_NAME);
        let mut pins = Self {
            path: path.clone(),
            entries: Vec::new(),
        };

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(pins),
            Err(e) => return Err(StoreError::io("failed to read pin file", path, e)),
        };

        for line in data.lines() {
            let Some((language, version)) = line.split_once('=') else {
                continue;
            };
            let language = language.trim();
            let version = version.trim();
            if language.is_empty() || version.is_empty() {
                continue;
            }
            pins.set(language, version);
        }
        Ok(pins)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, version)| version.as_str())
    }

    /// Set a pin, replacing any existing entry for the language
    pub fn set(&mut self, language: &str, version: &str) {
        match self.entries.iter_mut().find(|(lang, _)| lang == language) {
            Some(entry) => entry.1 = version.to_string(),
            None => self
                .entries
                .push((language.to_string(), version.to_string())),
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(lang, _)| lang.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let mut contents = String::new();
        for (language, version) in &self.entries {
            contents.push_str(&format!("{language} = {version}\n"));
        }
        fs::write(&self.path, contents)
            .map_err(|e| StoreError::io("failed to write pin file", &self.path, e))
    }
}
