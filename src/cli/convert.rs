use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use spectrace::{export, export::Encoding, Config};
use tracing::instrument;

use super::{terminal::Colorize, trace::write_to_file};

#[derive(Debug, Parser)]
pub struct Convert {
    /// Files or directories holding specification items (.json, .yaml, .yml)
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ExportFormat,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum ExportFormat {
    #[default]
    Json,
    Yaml,
    /// Specobject XML (write only)
    Specobject,
}

impl ExportFormat {
    fn write(self, trace: &spectrace::Trace, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Json => export::write(trace, Encoding::Json, out),
            Self::Yaml => export::write(trace, Encoding::Yaml, out),
            Self::Specobject => export::write_specobject(trace, out),
        }
    }
}

impl Convert {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let items = export::load_paths(&self.inputs)
            .context("failed to import specification items")?;
        // Tracing fills in the derived fields of each record.
        let trace = spectrace::Trace::build(items, config)
            .context("failed to trace specification items")?;

        match &self.output {
            Some(path) => {
                write_to_file(path, |out| self.format.write(&trace, out))?;
                println!(
                    "{}",
                    format!("Exported {} item(s) to {}", trace.len(), path.display()).success()
                );
            }
            None => {
                let stdout = io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                self.format
                    .write(&trace, &mut out)
                    .and_then(|()| out.flush())
                    .context("failed to write export document")?;
            }
        }
        Ok(())
    }
}
