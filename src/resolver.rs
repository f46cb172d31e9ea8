// Effective-version resolution: project pin over global default, never a guess

use std::path::Path;

use crate::error::Result;
use crate::store::{PinFile, VersionStore};

/// Where a resolved version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Local,
    Global,
}

impl std::fmt::Display for VersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSource::Local => write!(f, "local"),
            VersionSource::Global => write!(f, "global"),
        }
    }
}

/// Outcome of resolving a language in a project directory
///
/// `Dangling` means a pin or selection names a version that is no longer in
/// the store. That is a detectable warning state, reported as "not set"
/// downstream rather than silently treated as active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Active {
        version: String,
        source: VersionSource,
    },
    Dangling {
        version: String,
        source: VersionSource,
    },
    Unset,
}

/// Single authority for collapsing pins and global defaults into one answer
///
/// Precedence, first match wins: the project's local pin, then the global
/// selection. Absence of an explicit selection is always `Unset`; the
/// resolver never falls back to "newest installed" because silently picking
/// a version means silently running the wrong binary.
pub struct Resolver<'a> {
    store: &'a VersionStore,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a VersionStore) -> Self {
        Self { store }
    }

    /// Resolve the effective version for one language
    ///
    /// Pin lookup checks the exact project directory only; ancestor
    /// directories are not searched.
    pub fn resolve(&self, language: &str, project_dir: &Path) -> Result<Resolution> {
        let pins = PinFile::load(project_dir)?;
        if let Some(version) = pins.get(language) {
            return Ok(self.classify(language, version, VersionSource::Local));
        }
        if let Some(version) = self.store.global_selection(language)? {
            return Ok(self.classify(language, &version, VersionSource::Global));
        }
        Ok(Resolution::Unset)
    }

    fn classify(&self, language: &str, version: &str, source: VersionSource) -> Resolution {
        if self.store.is_installed(language, version) {
            Resolution::Active {
                version: version.to_string(),
                source,
            }
        } else {
            Resolution::Dangling {
                version: version.to_string(),
                source,
            }
        }
    }

    /// Universe of languages to consider in "all languages" mode: the union
    /// of globally selected languages and languages pinned in the project,
    /// sorted and deduplicated
    ///
    /// A language that only has a local pin must not be omitted.
    pub fn candidate_languages(&self, project_dir: &Path) -> Result<Vec<String>> {
        let mut languages = self.store.selected_languages()?;
        let pins = PinFile::load(project_dir)?;
        for language in pins.languages() {
            languages.push(language.to_string());
        }
        languages.sort();
        languages.dedup();
        Ok(languages)
    }
}
