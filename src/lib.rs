// kver - cross-language runtime version manager
// Library module: the resolution and lifecycle engine plus the CLI surface

pub mod activation;
pub mod cli;
pub mod error;
pub mod language;
pub mod lifecycle;
pub mod logging;
pub mod resolver;
pub mod store;

// Re-export main types for easier access
pub use activation::{ActivationEmitter, ActivationFragment};
pub use error::{exit_codes, KverError, Result, StoreError};
pub use language::{Plugin, PluginError, PluginRegistry};
pub use lifecycle::LifecycleManager;
pub use resolver::{Resolution, Resolver, VersionSource};
pub use store::{PinFile, VersionStore, PIN_FILE_NAME, ROOT_ENV_VAR};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
