// Error handling framework for kver
use std::path::PathBuf;
use thiserror::Error;

use crate::language::PluginError;

pub type Result<T> = std::result::Result<T, KverError>;

/// Main error type for kver
///
/// Every command failure surfaces through this enum with enough context
/// (language, version, phase) for the user to act. Plugin failures are never
/// swallowed or retried; rolling back a partial install is the only automatic
/// corrective action the system takes.
#[derive(Debug, Error)]
pub enum KverError {
    #[error("language not supported: {language}")]
    UnsupportedLanguage {
        language: String,
        available: Vec<String>,
    },

    #[error("{language} {version} is not installed")]
    NotInstalled { language: String, version: String },

    #[error("{language} {version} is already installed")]
    AlreadyInstalled { language: String, version: String },

    #[error("no version configured for {language}")]
    NotConfigured { language: String },

    #[error("install failed for {language} {version}: {source}")]
    Install {
        language: String,
        version: String,
        #[source]
        source: PluginError,
    },

    #[error("uninstall failed for {language} {version}: {source}")]
    Uninstall {
        language: String,
        version: String,
        #[source]
        source: PluginError,
    },

    #[error("remote listing failed for {language}: {source}")]
    RemoteList {
        language: String,
        #[source]
        source: PluginError,
    },

    #[error("plugin already registered: {language}")]
    DuplicatePlugin { language: String },

    #[error("version store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Version store errors with path context
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine home directory")]
    HomeDirNotFound,

    #[error("{message}: {path}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        StoreError::Io {
            message: message.into(),
            path: path.into(),
            source,
        }
    }
}

/// Process exit codes, one per error class
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNSUPPORTED_LANGUAGE: i32 = 2;
    pub const NOT_INSTALLED: i32 = 3;
    pub const ALREADY_INSTALLED: i32 = 4;
    pub const NOT_CONFIGURED: i32 = 5;
    pub const PLUGIN_FAILURE: i32 = 6;
    pub const STORE_ERROR: i32 = 7;
}

impl KverError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            KverError::UnsupportedLanguage { .. } => exit_codes::UNSUPPORTED_LANGUAGE,
            KverError::NotInstalled { .. } => exit_codes::NOT_INSTALLED,
            KverError::AlreadyInstalled { .. } => exit_codes::ALREADY_INSTALLED,
            KverError::NotConfigured { .. } => exit_codes::NOT_CONFIGURED,
            KverError::Install { .. }
            | KverError::Uninstall { .. }
            | KverError::RemoteList { .. } => exit_codes::PLUGIN_FAILURE,
            KverError::Store(_) => exit_codes::STORE_ERROR,
            KverError::DuplicatePlugin { .. } | KverError::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }

    /// Create a user-friendly error message with context
    pub fn user_message(&self, use_colors: bool) -> String {
        use tracing::error;
        error!(error = %self, "command failed");

        let mut output = String::new();
        if use_colors {
            output.push_str("\x1b[31m");
        }
        output.push_str("Error: ");
        if use_colors {
            output.push_str("\x1b[0m");
        }
        output.push_str(&self.to_string());

        match self {
            KverError::UnsupportedLanguage { available, .. } if !available.is_empty() => {
                output.push_str(&format!(
                    "\n  Help: supported languages: {}",
                    available.join(", ")
                ));
            }
            KverError::NotInstalled { language, version } => {
                output.push_str(&format!(
                    "\n  Help: install it with `kver install {language} {version}`"
                ));
            }
            KverError::AlreadyInstalled { language, version } => {
                output.push_str(&format!(
                    "\n  Help: remove it first with `kver uninstall {language} {version}`"
                ));
            }
            KverError::NotConfigured { language } => {
                output.push_str(&format!(
                    "\n  Help: select a version with `kver global {language} <version>` or `kver local {language} <version>`"
                ));
            }
            _ => {}
        }

        output
    }
}
