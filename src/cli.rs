// CLI interface for kver using clap
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::Path;
use tracing::warn;

use crate::activation::ActivationEmitter;
use crate::error::{exit_codes, KverError, Result};
use crate::language::PluginRegistry;
use crate::lifecycle::LifecycleManager;
use crate::logging::{init_logging, LogConfig};
use crate::resolver::{Resolution, Resolver};
use crate::store::VersionStore;

#[derive(Parser)]
#[command(
    name = "kver",
    about = "kver - a cross-language runtime version manager",
    version = crate::VERSION,
    long_about = "kver manages multiple versions of programming language toolchains side by side and selects which one is active: globally, per shell session, or pinned to a project directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Control color output (auto, always, never)
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and install a language version
    Install { language: String, version: String },

    /// Remove an installed language version
    Uninstall { language: String, version: String },

    /// List installed versions of a language
    List { language: String },

    /// List versions available upstream
    ListRemote { language: String },

    /// Write the persistent activation fragment for a version
    ///
    /// Without an explicit version, the effective version for the current
    /// directory is used.
    Use {
        language: String,
        version: Option<String>,
    },

    /// Set the global default version for a language
    Global { language: String, version: String },

    /// Pin a version for the current project directory (.kver file)
    Local { language: String, version: String },

    /// Show the effective version(s) for the current directory
    Current { language: Option<String> },

    /// Print shell code activating the effective version(s)
    Activate { language: Option<String> },

    /// Generate shell completion scripts
    GenerateCompletion { shell: Shell },
}

impl Cli {
    pub fn run(&self) -> Result<i32> {
        init_logging(&self.log_config());

        if let Commands::GenerateCompletion { shell } = &self.command {
            let mut cmd = Self::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut std::io::stdout());
            return Ok(exit_codes::SUCCESS);
        }

        let store = VersionStore::from_env()?;
        let registry = PluginRegistry::builtin()?;
        let lifecycle = LifecycleManager::new(&registry, &store);
        let emitter = ActivationEmitter::new(&registry, &store);
        let resolver = Resolver::new(&store);
        let cwd = std::env::current_dir()?;

        match &self.command {
            Commands::Install { language, version } => {
                lifecycle.install(language, version)?;
                println!("Installed {language} {version}");
            }

            Commands::Uninstall { language, version } => {
                lifecycle.uninstall(language, version)?;
                println!("Uninstalled {language} {version}");
            }

            Commands::List { language } => {
                registry.lookup(language)?;
                for version in store.installed_versions(language)? {
                    println!("{version}");
                }
            }

            Commands::ListRemote { language } => {
                let plugin = registry.lookup(language)?;
                let versions = plugin
                    .list_remote()
                    .map_err(|source| KverError::RemoteList {
                        language: language.clone(),
                        source,
                    })?;
                for version in versions {
                    println!("{version}");
                }
            }

            Commands::Use { language, version } => {
                registry.lookup(language)?;
                let version = match version {
                    Some(version) => version.clone(),
                    None => match resolver.resolve(language, &cwd)? {
                        Resolution::Active { version, .. } => version,
                        Resolution::Dangling { version, .. } => {
                            return Err(KverError::NotInstalled {
                                language: language.clone(),
                                version,
                            });
                        }
                        Resolution::Unset => {
                            return Err(KverError::NotConfigured {
                                language: language.clone(),
                            });
                        }
                    },
                };
                if !store.is_installed(language, &version) {
                    return Err(KverError::NotInstalled {
                        language: language.clone(),
                        version,
                    });
                }
                let path = emitter.persist(language, &version)?;
                println!("Now using {language} {version}");
                println!("Run `source {}` to load it into this shell", path.display());
            }

            Commands::Global { language, version } => {
                lifecycle.set_global(language, version)?;
                // refresh the persistent fragment so new shells pick it up
                emitter.persist(language, version)?;
                println!("Set global {language} version to {version}");
            }

            Commands::Local { language, version } => {
                lifecycle.set_local(language, version, &cwd)?;
                println!("Pinned {language} {version} in {}", cwd.display());
            }

            Commands::Current { language } => {
                let languages =
                    self.target_languages(language.as_deref(), &registry, &resolver, &cwd)?;
                for language in &languages {
                    match resolver.resolve(language, &cwd)? {
                        Resolution::Active { version, source } => {
                            println!("{language}: {version} ({source})");
                        }
                        Resolution::Dangling { version, source } => {
                            warn!(
                                language = %language,
                                version = %version,
                                source = %source,
                                "selected version is not installed"
                            );
                            println!("{language}: (not set)");
                        }
                        Resolution::Unset => println!("{language}: (not set)"),
                    }
                }
            }

            Commands::Activate { language } => {
                let languages =
                    self.target_languages(language.as_deref(), &registry, &resolver, &cwd)?;
                print!("{}", emitter.one_shot_script(&languages, &cwd)?);
            }

            // handled before the store is opened
            Commands::GenerateCompletion { .. } => {}
        }

        Ok(exit_codes::SUCCESS)
    }

    /// Languages a read-facing command operates on: the explicit argument
    /// (which must name a registered plugin), or the union of globally
    /// selected and locally pinned languages
    fn target_languages(
        &self,
        language: Option<&str>,
        registry: &PluginRegistry,
        resolver: &Resolver<'_>,
        cwd: &Path,
    ) -> Result<Vec<String>> {
        match language {
            Some(language) => {
                registry.lookup(language)?;
                Ok(vec![language.to_string()])
            }
            None => resolver.candidate_languages(cwd),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig::from_cli(self.verbose, self.quiet, self.color.as_deref())
    }
}
