// Shell activation: turning a resolved version into environment mutations

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::language::PluginRegistry;
use crate::resolver::{Resolution, Resolver};
use crate::store::VersionStore;

/// Environment mutation descriptor for one language version
///
/// A set of variable assignments plus a single PATH prepend; renders to
/// POSIX shell text ready for `eval` or `source`. Produced by plugins (or
/// the generic default) and consumed by the emitter, never read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationFragment {
    vars: Vec<(String, String)>,
    path_prepend: PathBuf,
}

impl ActivationFragment {
    /// Fragment that only prepends a directory to PATH
    pub fn path_prepend(bin_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: Vec::new(),
            path_prepend: bin_dir.into(),
        }
    }

    /// Add a variable assignment, keeping insertion order
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    /// Render as shell text
    pub fn to_shell(&self) -> String {
        let mut script = String::new();
        for (key, value) in &self.vars {
            script.push_str(&format!("export {key}=\"{}\"\n", shell_escape(value)));
        }
        script.push_str(&format!(
            "export PATH=\"{}:$PATH\"\n",
            shell_escape(&self.path_prepend.display().to_string())
        ));
        script
    }
}

/// Escape a value for interpolation inside a double-quoted shell string
///
/// The store root is user-controlled via `KVER_ROOT`, so rendered paths may
/// carry characters the shell would otherwise expand on `eval`.
fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Produces activation output in one-shot and persistent modes
///
/// Activation is a consequence of resolution, never an input to it: the
/// emitter resolves, renders, and either prints or writes. It does not
/// decide which version is active and it never guesses one.
pub struct ActivationEmitter<'a> {
    registry: &'a PluginRegistry,
    store: &'a VersionStore,
}

impl<'a> ActivationEmitter<'a> {
    pub fn new(registry: &'a PluginRegistry, store: &'a VersionStore) -> Self {
        Self { registry, store }
    }

    /// Fragment for a language+version
    ///
    /// Languages without a registered plugin get the generic PATH prepend,
    /// so a pin for an unregistered language still activates cleanly.
    pub fn fragment(&self, language: &str, version: &str) -> ActivationFragment {
        let install_dir = self.store.install_dir(language, version);
        match self.registry.get(language) {
            Some(plugin) => plugin.activation_fragment(version, &install_dir),
            None => ActivationFragment::path_prepend(install_dir.join("bin")),
        }
    }

    /// One-shot mode: shell text covering every language with an effective
    /// version; unset languages are skipped silently, dangling selections
    /// are skipped with a warning
    pub fn one_shot_script(&self, languages: &[String], project_dir: &Path) -> Result<String> {
        let resolver = Resolver::new(self.store);
        let mut script = String::new();
        for language in languages {
            match resolver.resolve(language, project_dir)? {
                Resolution::Active { version, .. } => {
                    debug!(language = %language, version = %version, "activating");
                    script.push_str(&self.fragment(language, &version).to_shell());
                }
                Resolution::Dangling { version, .. } => {
                    warn!(
                        language = %language,
                        version = %version,
                        "selected version is not installed; skipping"
                    );
                }
                Resolution::Unset => {}
            }
        }
        Ok(script)
    }

    /// Persistent mode: write the fragment under `env.d` and return the path
    /// the user must source (no process can mutate its parent shell)
    pub fn persist(&self, language: &str, version: &str) -> Result<PathBuf> {
        let dir = self.store.activation_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::io("failed to create activation directory", &dir, e))?;
        let path = self.store.activation_file(language);
        fs::write(&path, self.fragment(language, version).to_shell())
            .map_err(|e| StoreError::io("failed to write activation fragment", &path, e))?;
        Ok(path)
    }
}

/// Remove a persisted fragment if it references the given install directory
///
/// Used by uninstall: a fragment pointing at a different (still installed)
/// version is left alone. Matching requires a path boundary after the
/// directory, since version strings are opaque and one is often a string
/// prefix of another (`1.22` vs `1.22.1`).
pub fn remove_fragment_referencing(
    store: &VersionStore,
    language: &str,
    install_dir: &Path,
) -> Result<()> {
    let path = store.activation_file(language);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(StoreError::io("failed to read activation fragment", path, e).into());
        }
    };
    // fragments quote every path, so the directory appears as "<dir>",
    // "<dir>/..." or "<dir>:$PATH"
    let rendered = shell_escape(&install_dir.display().to_string());
    let referenced = [
        format!("\"{rendered}\""),
        format!("\"{rendered}/"),
        format!("\"{rendered}:"),
    ]
    .iter()
    .any(|needle| contents.contains(needle));
    if referenced {
        fs::remove_file(&path)
            .map_err(|e| StoreError::io("failed to remove activation fragment", &path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_rendering_order() {
        let fragment = ActivationFragment::path_prepend("/store/languages/go/1.22.1/bin")
            .with_var("GOROOT", "/store/languages/go/1.22.1");
        assert_eq!(
            fragment.to_shell(),
            "export GOROOT=\"/store/languages/go/1.22.1\"\n\
             export PATH=\"/store/languages/go/1.22.1/bin:$PATH\"\n"
        );
    }

    #[test]
    fn test_fragment_escapes_shell_metacharacters() {
        let fragment = ActivationFragment::path_prepend("/store/my \"odd\" root/bin")
            .with_var("GOROOT", "/store/$HOME/`x`");
        let script = fragment.to_shell();
        assert!(script.contains("export GOROOT=\"/store/\\$HOME/\\`x\\`\""));
        assert!(script.contains("export PATH=\"/store/my \\\"odd\\\" root/bin:$PATH\""));
    }

    #[test]
    fn test_remove_fragment_requires_path_boundary() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = VersionStore::new(dir.path());
        fs::create_dir_all(store.activation_dir()).unwrap();

        let install_dir = store.install_dir("go", "1.22.1");
        let fragment = ActivationFragment::path_prepend(install_dir.join("bin"))
            .with_var("GOROOT", install_dir.display().to_string());
        fs::write(store.activation_file("go"), fragment.to_shell()).unwrap();

        // 1.22 is a string prefix of 1.22.1 but a different version
        remove_fragment_referencing(&store, "go", &store.install_dir("go", "1.22")).unwrap();
        assert!(store.activation_file("go").exists());

        remove_fragment_referencing(&store, "go", &install_dir).unwrap();
        assert!(!store.activation_file("go").exists());
    }

    #[test]
    fn test_remove_fragment_referencing() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = VersionStore::new(dir.path());
        fs::create_dir_all(store.activation_dir()).unwrap();

        let install_dir = store.install_dir("go", "1.22.1");
        let fragment = ActivationFragment::path_prepend(install_dir.join("bin"));
        fs::write(store.activation_file("go"), fragment.to_shell()).unwrap();

        // a different version's directory does not match
        let other_dir = store.install_dir("go", "1.21.0");
        remove_fragment_referencing(&store, "go", &other_dir).unwrap();
        assert!(store.activation_file("go").exists());

        remove_fragment_referencing(&store, "go", &install_dir).unwrap();
        assert!(!store.activation_file("go").exists());

        // idempotent when the fragment is already gone
        remove_fragment_referencing(&store, "go", &install_dir).unwrap();
    }
}
