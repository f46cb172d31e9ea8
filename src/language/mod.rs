// Language backend architecture: the plugin contract, the registry, and the
// built-in backends

pub mod fetch;
pub mod golang;
pub mod nodejs;
pub mod registry;
pub mod traits;

pub use registry::PluginRegistry;
pub use traits::{Plugin, PluginError};
