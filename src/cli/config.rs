use std::path::Path;

use anyhow::Context;
use spectrace::{Config, Verbosity};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Parser)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Require items of an artifact type to be covered by other types
    AddNeed {
        /// The artifact type that needs coverage (e.g. req)
        artifact_type: String,

        /// The artifact types that must cover it (e.g. dsn impl)
        #[arg(num_args = 1..)]
        covering: Vec<String>,
    },

    /// Remove coverage rules from the needs table
    RemoveNeed {
        /// The artifact type that needs coverage
        artifact_type: String,

        /// The covering artifact types to remove
        #[arg(num_args = 1..)]
        covering: Vec<String>,
    },

    /// Set the verbosity reports use when none is given
    SetVerbosity {
        /// The default verbosity
        #[arg(value_enum)]
        verbosity: Verbosity,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let mut config = if config_path.exists() {
            Config::load(config_path)
                .with_context(|| format!("failed to load {}", config_path.display()))?
        } else {
            Config::default()
        };

        match self.command {
            ConfigCommand::Show => {
                show(&config);
                return Ok(());
            }
            ConfigCommand::AddNeed {
                artifact_type,
                covering,
            } => {
                validate_type(&artifact_type)?;
                let mut added = Vec::new();
                for covering_type in covering {
                    validate_type(&covering_type)?;
                    if config.add_need(artifact_type.clone(), covering_type.clone()) {
                        added.push(covering_type);
                    }
                }
                if added.is_empty() {
                    println!("{}", "Nothing to add: rules already present".dim());
                    return Ok(());
                }
                println!(
                    "{}",
                    format!("'{artifact_type}' now needs: {}", added.join(", ")).success()
                );
            }
            ConfigCommand::RemoveNeed {
                artifact_type,
                covering,
            } => {
                let mut removed = Vec::new();
                for covering_type in covering {
                    if config.remove_need(&artifact_type, &covering_type) {
                        removed.push(covering_type);
                    }
                }
                if removed.is_empty() {
                    println!("{}", "Nothing to remove: no matching rules".dim());
                    return Ok(());
                }
                println!(
                    "{}",
                    format!(
                        "'{artifact_type}' no longer needs: {}",
                        removed.join(", ")
                    )
                    .success()
                );
            }
            ConfigCommand::SetVerbosity { verbosity } => {
                config.set_default_verbosity(verbosity);
                println!("{}", format!("Default verbosity: {verbosity:?}").success());
            }
        }

        config
            .save(config_path)
            .with_context(|| format!("failed to save {}", config_path.display()))?;
        tracing::info!("saved configuration to {}", config_path.display());
        Ok(())
    }
}

fn validate_type(artifact_type: &str) -> anyhow::Result<()> {
    if artifact_type.trim().is_empty() {
        anyhow::bail!("artifact types must not be empty");
    }
    if artifact_type.contains(spectrace::domain::identifier::SEPARATOR) {
        anyhow::bail!(
            "invalid artifact type '{artifact_type}': must not contain '{}'",
            spectrace::domain::identifier::SEPARATOR
        );
    }
    Ok(())
}

fn show(config: &Config) {
    println!("Configuration:");
    println!("  default_verbosity: {:?}", config.default_verbosity());
    if config.needs().is_empty() {
        println!("  needs: {}", "(none)".dim());
        return;
    }
    println!("  needs:");
    for (artifact_type, covering) in config.needs() {
        let covering: Vec<&str> = covering.iter().map(String::as_str).collect();
        println!("    {artifact_type}: {}", covering.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ConfigCommand,
    }

    fn run(config_path: &Path, args: &[&str]) {
        let harness = Harness::try_parse_from(std::iter::once("config").chain(args.iter().copied()))
            .unwrap();
        Command {
            command: harness.command,
        }
        .run(config_path)
        .unwrap();
    }

    #[test]
    fn add_and_remove_needs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("spectrace.toml");

        run(&path, &["add-need", "req", "dsn", "utest"]);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.needs_for("req").len(), 2);

        run(&path, &["remove-need", "req", "utest"]);
        let config = Config::load(&path).unwrap();
        assert!(config.needs_for("req").contains("dsn"));
        assert!(!config.needs_for("req").contains("utest"));
    }

    #[test]
    fn set_verbosity_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("spectrace.toml");

        run(&path, &["set-verbosity", "all"]);
        assert_eq!(Config::load(&path).unwrap().default_verbosity(), Verbosity::All);
    }

    #[test]
    fn rejects_separator_in_type() {
        assert!(validate_type("re~q").is_err());
        assert!(validate_type(" ").is_err());
        assert!(validate_type("req").is_ok());
    }
}
