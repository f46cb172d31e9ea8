// Plugin registration and lookup

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{KverError, Result};

use super::traits::Plugin;

/// Language plugin registry
///
/// Built once before command dispatch and read-only afterwards; lookups take
/// `&self` and there is no interior mutability. Tests construct registries
/// with mock plugins the same way `builtin` does.
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Registry with the built-in language backends
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(super::golang::GoPlugin::new()))?;
        registry.register(Arc::new(super::nodejs::NodejsPlugin::new()))?;
        Ok(registry)
    }

    /// Register a plugin; duplicate names are a programming error
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(KverError::DuplicatePlugin { language: name });
        }
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(language).cloned()
    }

    /// Lookup that surfaces `UnsupportedLanguage` with the supported set
    pub fn lookup(&self, language: &str) -> Result<Arc<dyn Plugin>> {
        self.get(language)
            .ok_or_else(|| KverError::UnsupportedLanguage {
                language: language.to_string(),
                available: self.names(),
            })
    }

    /// Registered language names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::result::Result;

    use super::super::traits::PluginError;
    use super::*;

    struct NamedPlugin(&'static str);

    impl Plugin for NamedPlugin {
        fn name(&self) -> &'static str {
            self.0
        }

        fn install(&self, _version: &str, _dest: &Path) -> Result<(), PluginError> {
            Ok(())
        }

        fn list_remote(&self) -> Result<Vec<String>, PluginError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(NamedPlugin("go"))).unwrap();
        registry.register(Arc::new(NamedPlugin("nodejs"))).unwrap();

        assert!(registry.get("go").is_some());
        assert!(registry.get("GO").is_none(), "names are case-sensitive");
        assert_eq!(registry.names(), ["go", "nodejs"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(NamedPlugin("go"))).unwrap();
        let result = registry.register(Arc::new(NamedPlugin("go")));
        assert!(matches!(
            result,
            Err(KverError::DuplicatePlugin { ref language }) if language == "go"
        ));
    }

    #[test]
    fn test_lookup_unknown_language() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(NamedPlugin("go"))).unwrap();

        let error = registry
            .lookup("cobol")
            .err()
            .expect("lookup of unknown language must fail");
        match error {
            KverError::UnsupportedLanguage {
                language,
                available,
            } => {
                assert_eq!(language, "cobol");
                assert_eq!(available, ["go"]);
            }
            other => panic!("expected UnsupportedLanguage, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = PluginRegistry::builtin().unwrap();
        assert_eq!(registry.names(), ["go", "nodejs"]);
    }
}
