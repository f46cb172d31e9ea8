// Logging setup for kver
use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration derived from the CLI flags
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (error with --quiet, debug with --verbose, info otherwise)
    pub level: Level,
    /// Color output configuration
    pub color: ColorConfig,
}

/// Color output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorConfig {
    Auto,
    Always,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            color: ColorConfig::Auto,
        }
    }
}

impl LogConfig {
    /// Create logging configuration from CLI arguments
    pub fn from_cli(verbose: bool, quiet: bool, color: Option<&str>) -> Self {
        let level = if quiet {
            Level::ERROR
        } else if verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };

        let color = match color {
            Some("always") => ColorConfig::Always,
            Some("never") => ColorConfig::Never,
            _ => ColorConfig::Auto,
        };

        Self { level, color }
    }

    /// Check if colors should be used based on configuration and terminal
    pub fn should_use_colors(&self) -> bool {
        match self.color {
            ColorConfig::Always => true,
            ColorConfig::Never => false,
            ColorConfig::Auto => {
                io::stderr().is_terminal()
                    && std::env::var("TERM").map_or(true, |term| term != "dumb")
                    && std::env::var("NO_COLOR").is_err()
            }
        }
    }
}

/// Initialize the logging system with the given configuration
///
/// Logs go to stderr: stdout is reserved for command output, which for
/// `activate` is shell code the invoking shell evaluates.
pub fn init_logging(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kver={}", config.level)));

    // a second init (e.g. in tests) is harmless
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_ansi(config.should_use_colors())
        .try_init();
}
