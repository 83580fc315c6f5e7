use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use spectrace::{
    export,
    report::{Newline, PlainText, Renderer},
    Config, ReportFormat, Verbosity,
};
use tracing::instrument;

use super::terminal::ColorChoice;

#[derive(Debug, Parser)]
pub struct Trace {
    /// Files or directories holding specification items (.json, .yaml, .yml)
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "plain")]
    format: ReportFormat,

    /// Report verbosity [default: from configuration]
    #[arg(long, value_enum)]
    verbosity: Option<Verbosity>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// When to color the plain text report
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Line ending of plain text and HTML reports
    #[arg(long, value_enum, default_value = "unix")]
    newline: Newline,
}

impl Trace {
    /// Trace the inputs and write the report.
    ///
    /// Returns whether the trace passed.
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<bool> {
        let items = export::load_paths(&self.inputs)
            .context("failed to import specification items")?;
        let trace = spectrace::Trace::build(items, config)
            .context("failed to trace specification items")?;

        let verbosity = self
            .verbosity
            .unwrap_or_else(|| config.default_verbosity());
        let renderer = self.format.renderer(self.color.enabled(self.output.is_none()));
        tracing::debug!(format = %self.format, ?verbosity, newline = ?self.newline, "rendering report");

        match &self.output {
            Some(path) => {
                write_to_file(path, |out| {
                    renderer.render(&trace, verbosity, self.newline, out)
                })?;
                if verbosity > Verbosity::Quiet {
                    let mut console = io::stdout().lock();
                    print_verdict(&trace, path, self.color.enabled(true), &mut console)
                        .context("failed to write verdict")?;
                }
            }
            None => {
                let mut console = BufWriter::new(io::stdout().lock());
                renderer
                    .render(&trace, verbosity, self.newline, &mut console)
                    .and_then(|()| console.flush())
                    .context("failed to write report")?;
            }
        }

        Ok(trace.result())
    }
}

/// Create `path` and write to it through a buffer.
pub fn write_to_file(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let sink: &mut dyn Write = &mut out;
    write(sink)
        .and_then(|()| out.flush())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Summary line plus the report location, for reports written to a file.
fn print_verdict(
    trace: &spectrace::Trace,
    path: &Path,
    color: bool,
    out: &mut dyn Write,
) -> io::Result<()> {
    PlainText::new(color).render(trace, Verbosity::Summary, Newline::Unix, out)?;
    let location = format!("Report written to {}", path.display());
    if color {
        writeln!(out, "{}", location.dimmed())
    } else {
        writeln!(out, "{location}")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use spectrace::{export::Encoding, Identifier, SpecificationItem};

    use super::*;

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    fn write_items(dir: &Path, items: Vec<SpecificationItem>) -> PathBuf {
        let trace = spectrace::Trace::build(items, &Config::default()).unwrap();
        let path = dir.join("items.json");
        let mut buffer = Vec::new();
        export::write(&trace, Encoding::Json, &mut buffer).unwrap();
        fs::write(&path, buffer).unwrap();
        path
    }

    fn passing(dir: &Path) -> PathBuf {
        write_items(
            dir,
            vec![
                SpecificationItem::builder(id("req~Req-1~0"))
                    .needs("dsn")
                    .build()
                    .unwrap(),
                SpecificationItem::builder(id("dsn~Dsn-1~0"))
                    .covers(id("req~Req-1"))
                    .build()
                    .unwrap(),
            ],
        )
    }

    fn command(args: &[&str]) -> Trace {
        Trace::try_parse_from(std::iter::once("trace").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn html_report_of_passing_trace_is_written_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let input = passing(tmp.path());
        let report = tmp.path().join("report.html");

        let passed = command(&[
            input.to_str().unwrap(),
            "--format",
            "html",
            "--verbosity",
            "all",
            "--output",
            report.to_str().unwrap(),
        ])
        .run(&Config::default())
        .unwrap();

        assert!(passed);
        let html = fs::read_to_string(&report).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<h1>ok - 2 total</h1>"));
        assert!(html.contains("id=\"dsn~Dsn-1~0\""));
    }

    #[test]
    fn failing_trace_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_items(
            tmp.path(),
            vec![
                SpecificationItem::builder(id("req~Req-1~0"))
                    .needs("dsn")
                    .build()
                    .unwrap(),
            ],
        );
        let report = tmp.path().join("report.txt");

        let passed = command(&[
            input.to_str().unwrap(),
            "--newline",
            "windows",
            "--output",
            report.to_str().unwrap(),
        ])
        .run(&Config::default())
        .unwrap();

        assert!(!passed);
        assert_eq!(
            fs::read_to_string(&report).unwrap(),
            "not ok - in:0/0 out:0/0 - req~Req-1~0\r\n  uncovered: dsn\r\nnot ok - 1 total, 1 defect\r\n"
        );
    }

    #[test]
    fn configured_needs_apply() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_items(
            tmp.path(),
            vec![SpecificationItem::builder(id("impl~Impl-1~0")).build().unwrap()],
        );
        let mut config = Config::default();
        config.add_need("impl", "utest");

        let passed = command(&[
            input.to_str().unwrap(),
            "--verbosity",
            "quiet",
        ])
        .run(&config)
        .unwrap();

        assert!(!passed);
    }

    #[test]
    fn missing_input_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nowhere.json");

        assert!(command(&[missing.to_str().unwrap()])
            .run(&Config::default())
            .is_err());
    }

    #[test]
    fn uncolored_verdict_has_no_escapes() {
        let trace = spectrace::Trace::build(
            vec![
                SpecificationItem::builder(id("req~Req-1~0"))
                    .needs("dsn")
                    .build()
                    .unwrap(),
            ],
            &Config::default(),
        )
        .unwrap();

        let mut out = Vec::new();
        print_verdict(&trace, Path::new("report.html"), false, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert_eq!(
            output,
            "not ok - 1 total, 1 defect\nReport written to report.html\n"
        );
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn colored_verdict_uses_escapes() {
        let trace = spectrace::Trace::build(Vec::new(), &Config::default()).unwrap();

        let mut out = Vec::new();
        print_verdict(&trace, Path::new("report.html"), true, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains('\u{1b}'));
    }
}
