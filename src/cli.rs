use std::{
    path::{Path, PathBuf},
    process,
};

mod config;
mod convert;
mod terminal;
mod trace;

use anyhow::Context;
use clap::ArgAction;
use convert::Convert;
use spectrace::Config;
use trace::Trace;

/// The configuration file used when `--config` is not given.
const DEFAULT_CONFIG: &str = "spectrace.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the configuration file [default: spectrace.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let explicit = self.config.is_some();
        let config_path = self
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

        if !self.command.run(&config_path, explicit)? {
            process::exit(1);
        }
        Ok(())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Trace specification items and report their coverage
    ///
    /// Exits with status 1 when any item is not adequately covered.
    Trace(Trace),

    /// Import specification items and write them as an export document
    Convert(Convert),

    /// Show or modify configuration settings
    Config(config::Command),
}

impl Command {
    /// Run the subcommand. `false` means the process should exit with
    /// status 1.
    fn run(self, config_path: &Path, explicit: bool) -> anyhow::Result<bool> {
        match self {
            Self::Trace(command) => command.run(&load_config(config_path, explicit)?),
            Self::Convert(command) => {
                command.run(&load_config(config_path, explicit)?)?;
                Ok(true)
            }
            Self::Config(command) => {
                command.run(config_path)?;
                Ok(true)
            }
        }
    }
}

/// Load the configuration file.
///
/// A missing default file yields the default configuration; a missing file
/// given on the command line is an error.
fn load_config(path: &Path, explicit: bool) -> anyhow::Result<Config> {
    if !explicit && !path.exists() {
        tracing::debug!(
            "no configuration file at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let config = Config::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::debug!("loaded configuration from {}", path.display());
    Ok(config)
}
