//! Report renderers.
//!
//! Every renderer consumes a finished [`Trace`] and writes to an output
//! stream. Renderers only filter and format; all link statuses and coverage
//! sets come from the trace.

use std::{fmt, io, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    export::{self, Encoding},
    Trace,
};

/// `writeln!` with the report's line ending.
macro_rules! write_line {
    ($out:expr, $newline:expr, $($arg:tt)*) => {
        write!($out, "{}{}", format_args!($($arg)*), $newline)
    };
}

mod html;
mod plain_text;

pub use html::{html_escape, Html};
pub use plain_text::PlainText;

/// How much of the trace a report shows.
///
/// Levels are ordered: each level shows at least as much as the previous one.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Verbosity {
    /// No output at all. The verdict is only visible through the exit code.
    Quiet,
    /// The verdict only.
    Minimal,
    /// The summary line.
    Summary,
    /// Identifiers of the defect items.
    Failures,
    /// One line per defect item, then the summary line.
    FailureSummaries,
    /// Defect items with their uncovered types and defective links.
    #[default]
    FailureDetails,
    /// Every item with details.
    All,
}

impl Verbosity {
    /// Whether item lines are limited to defect items.
    #[must_use]
    pub const fn failures_only(self) -> bool {
        !matches!(self, Self::All)
    }
}

/// Line ending of text reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Newline {
    /// `\n`
    #[default]
    Unix,
    /// `\r\n`
    Windows,
}

impl Newline {
    /// The line ending itself.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unix => "\n",
            Self::Windows => "\r\n",
        }
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Line-oriented text for terminals and CI logs.
    #[default]
    Plain,
    /// A standalone HTML document.
    Html,
    /// The export document, as JSON.
    Json,
    /// The export document, as YAML.
    Yaml,
    /// Specobject XML, grouped by artifact type.
    Specobject,
}

impl ReportFormat {
    /// The format's name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Html => "html",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Specobject => "specobject",
        }
    }

    /// The renderer for this format.
    ///
    /// `color` only affects the plain text renderer.
    #[must_use]
    pub fn renderer(self, color: bool) -> Box<dyn Renderer> {
        match self {
            Self::Plain => Box::new(PlainText::new(color)),
            Self::Html => Box::new(Html),
            Self::Json => Box::new(Export(Encoding::Json)),
            Self::Yaml => Box::new(Export(Encoding::Yaml)),
            Self::Specobject => Box::new(Specobject),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The format name is not known.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown report format '{0}': expected plain, html, json, yaml or specobject")]
pub struct UnknownFormatError(String);

impl FromStr for ReportFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "plaintext" | "text" => Ok(Self::Plain),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "specobject" | "xml" => Ok(Self::Specobject),
            _ => Err(UnknownFormatError(s.to_string())),
        }
    }
}

/// Writes a trace in one output format.
pub trait Renderer {
    /// Render `trace` at the given verbosity, ending lines with `newline`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    fn render(
        &self,
        trace: &Trace,
        verbosity: Verbosity,
        newline: Newline,
        out: &mut dyn io::Write,
    ) -> io::Result<()>;
}

/// Renders the export document. Verbosity and line ending do not apply: an
/// export always holds every item.
#[derive(Debug, Clone, Copy)]
struct Export(Encoding);

impl Renderer for Export {
    fn render(
        &self,
        trace: &Trace,
        _verbosity: Verbosity,
        _newline: Newline,
        out: &mut dyn io::Write,
    ) -> io::Result<()> {
        export::write(trace, self.0, out)
    }
}

/// Renders specobject XML. Verbosity and line ending do not apply.
#[derive(Debug, Clone, Copy)]
struct Specobject;

impl Renderer for Specobject {
    fn render(
        &self,
        trace: &Trace,
        _verbosity: Verbosity,
        _newline: Newline,
        out: &mut dyn io::Write,
    ) -> io::Result<()> {
        export::write_specobject(trace, out)
    }
}
