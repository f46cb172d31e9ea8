// Lifecycle manager tests: atomic install/uninstall over a temporary store

use std::fs;
use std::path::Path;
use std::sync::Arc;

use kver::{
    ActivationEmitter, KverError, LifecycleManager, PinFile, Plugin, PluginError, PluginRegistry,
    Resolution, Resolver, VersionSource, VersionStore,
};

/// Backend that materializes a tiny but complete version payload
struct MockPlugin {
    name: &'static str,
}

impl Plugin for MockPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn install(&self, version: &str, dest: &Path) -> Result<(), PluginError> {
        fs::create_dir_all(dest.join("bin"))?;
        fs::write(dest.join("bin").join(self.name), version)?;
        Ok(())
    }

    fn list_remote(&self) -> Result<Vec<String>, PluginError> {
        Ok(vec!["1.0.0".to_string(), "2.0.0".to_string()])
    }
}

/// Backend that writes part of its payload and then fails
struct FailingPlugin;

impl Plugin for FailingPlugin {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn install(&self, _version: &str, dest: &Path) -> Result<(), PluginError> {
        fs::write(dest.join("partial.bin"), b"half an archive")?;
        Err(PluginError::Download {
            url: "https://example.invalid/flaky.tar.gz".to_string(),
            reason: "simulated mid-transfer failure".to_string(),
        })
    }

    fn list_remote(&self) -> Result<Vec<String>, PluginError> {
        Ok(Vec::new())
    }
}

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry
        .register(Arc::new(MockPlugin { name: "go" }))
        .unwrap();
    registry
        .register(Arc::new(MockPlugin { name: "nodejs" }))
        .unwrap();
    registry.register(Arc::new(FailingPlugin)).unwrap();
    registry
}

fn temp_store() -> (tempfile::TempDir, VersionStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = VersionStore::new(dir.path());
    (dir, store)
}

fn staging_entries(store: &VersionStore) -> usize {
    match fs::read_dir(store.root().join("tmp")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[test]
fn test_install_publishes_complete_directory() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);

    lifecycle.install("go", "1.0.0").unwrap();

    assert!(store.is_installed("go", "1.0.0"));
    let payload = store.install_dir("go", "1.0.0").join("bin").join("go");
    assert_eq!(fs::read_to_string(payload).unwrap(), "1.0.0");
    assert_eq!(staging_entries(&store), 0, "staging must not accumulate");
}

#[test]
fn test_install_rolls_back_partial_writes() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);

    let result = lifecycle.install("flaky", "1.0.0");

    assert!(matches!(result, Err(KverError::Install { .. })));
    assert!(
        !store.install_dir("flaky", "1.0.0").exists(),
        "a failed install must leave nothing behind"
    );
    assert_eq!(staging_entries(&store), 0, "staging must be cleaned up");
}

#[test]
fn test_install_rejects_already_installed() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);

    lifecycle.install("go", "1.0.0").unwrap();
    let result = lifecycle.install("go", "1.0.0");

    assert!(matches!(result, Err(KverError::AlreadyInstalled { .. })));
    assert!(store.is_installed("go", "1.0.0"));
}

#[test]
fn test_unknown_language_on_every_mutating_path() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let project = tempfile::TempDir::new().unwrap();

    assert!(matches!(
        lifecycle.install("cobol", "1.0.0"),
        Err(KverError::UnsupportedLanguage { .. })
    ));
    assert!(matches!(
        lifecycle.uninstall("cobol", "1.0.0"),
        Err(KverError::UnsupportedLanguage { .. })
    ));
    assert!(matches!(
        lifecycle.set_global("cobol", "1.0.0"),
        Err(KverError::UnsupportedLanguage { .. })
    ));
    assert!(matches!(
        lifecycle.set_local("cobol", "1.0.0", project.path()),
        Err(KverError::UnsupportedLanguage { .. })
    ));
}

#[test]
fn test_uninstall_of_absent_version_leaves_store_unchanged() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);

    lifecycle.install("go", "1.0.0").unwrap();
    let result = lifecycle.uninstall("go", "9.9.9");

    assert!(matches!(result, Err(KverError::NotInstalled { .. })));
    assert_eq!(store.installed_versions("go").unwrap(), ["1.0.0"]);
}

#[test]
fn test_uninstall_leaves_selection_dangling_and_detectable() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let project = tempfile::TempDir::new().unwrap();

    lifecycle.install("go", "1.0.0").unwrap();
    lifecycle.set_global("go", "1.0.0").unwrap();
    lifecycle.uninstall("go", "1.0.0").unwrap();

    // the selection is not auto-cleared...
    assert_eq!(
        store.global_selection("go").unwrap(),
        Some("1.0.0".to_string())
    );
    // ...but resolution reports it as dangling, which `current` renders as
    // "(not set)" instead of silently claiming 1.0.0 is active
    let resolution = Resolver::new(&store)
        .resolve("go", project.path())
        .unwrap();
    assert_eq!(
        resolution,
        Resolution::Dangling {
            version: "1.0.0".to_string(),
            source: VersionSource::Global,
        }
    );
}

#[test]
fn test_uninstall_removes_only_matching_activation_fragment() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let emitter = ActivationEmitter::new(&registry, &store);

    lifecycle.install("go", "1.0.0").unwrap();
    lifecycle.install("go", "2.0.0").unwrap();

    // fragment points at 2.0.0; removing 1.0.0 must not touch it
    emitter.persist("go", "2.0.0").unwrap();
    lifecycle.uninstall("go", "1.0.0").unwrap();
    assert!(store.activation_file("go").exists());

    lifecycle.uninstall("go", "2.0.0").unwrap();
    assert!(!store.activation_file("go").exists());
}

#[test]
fn test_uninstall_of_prefix_version_keeps_other_fragment() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let emitter = ActivationEmitter::new(&registry, &store);

    // 1.22 is a string prefix of 1.22.1; versions are opaque, so the
    // fragment match has to stop at a path boundary
    lifecycle.install("go", "1.22").unwrap();
    lifecycle.install("go", "1.22.1").unwrap();
    emitter.persist("go", "1.22.1").unwrap();

    lifecycle.uninstall("go", "1.22").unwrap();
    assert!(
        store.activation_file("go").exists(),
        "fragment for still-installed 1.22.1 must survive uninstalling 1.22"
    );

    lifecycle.uninstall("go", "1.22.1").unwrap();
    assert!(!store.activation_file("go").exists());
}

#[test]
fn test_set_global_requires_installed_version() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);

    let result = lifecycle.set_global("go", "1.0.0");
    assert!(matches!(result, Err(KverError::NotInstalled { .. })));
    assert_eq!(store.global_selection("go").unwrap(), None);
}

#[test]
fn test_set_local_round_trip_updates_in_place() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let project = tempfile::TempDir::new().unwrap();

    lifecycle.install("go", "1.0.0").unwrap();
    lifecycle.install("go", "2.0.0").unwrap();

    lifecycle.set_local("go", "1.0.0", project.path()).unwrap();
    let pins = PinFile::load(project.path()).unwrap();
    assert_eq!(pins.get("go"), Some("1.0.0"));

    lifecycle.set_local("go", "2.0.0", project.path()).unwrap();
    let contents = fs::read_to_string(project.path().join(".kver")).unwrap();
    assert_eq!(contents, "go = 2.0.0\n", "no duplicate entry after update");
}

#[test]
fn test_set_local_requires_installed_but_not_global() {
    let (_dir, store) = temp_store();
    let registry = registry();
    let lifecycle = LifecycleManager::new(&registry, &store);
    let project = tempfile::TempDir::new().unwrap();

    assert!(matches!(
        lifecycle.set_local("go", "1.0.0", project.path()),
        Err(KverError::NotInstalled { .. })
    ));

    lifecycle.install("go", "1.0.0").unwrap();
    lifecycle.set_local("go", "1.0.0", project.path()).unwrap();

    // no global default exists, the pin alone resolves
    let resolution = Resolver::new(&store)
        .resolve("go", project.path())
        .unwrap();
    assert_eq!(
        resolution,
        Resolution::Active {
            version: "1.0.0".to_string(),
            source: VersionSource::Local,
        }
    );
}
