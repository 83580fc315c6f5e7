use std::io::{self, Write};

use owo_colors::{colors::css, OwoColorize};

use super::{Newline, Renderer, Verbosity};
use crate::{Direction, LinkedItem, Trace, TracedLink};

/// Line-oriented report.
///
/// Item lines have the form `ok - in:1/1 out:0/0 - req~Req-1~0`, where each
/// pair counts the links providing coverage against all links in that
/// direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText {
    color: bool,
}

impl PlainText {
    /// A renderer that colors verdicts when `color` is set.
    #[must_use]
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    fn verdict(self, ok: bool) -> String {
        match (ok, self.color) {
            (true, true) => "ok".fg::<css::Green>().to_string(),
            (true, false) => "ok".to_string(),
            (false, true) => "not ok".fg::<css::Red>().to_string(),
            (false, false) => "not ok".to_string(),
        }
    }

    fn render_item(
        self,
        trace: &Trace,
        item: &LinkedItem,
        details: bool,
        newline: Newline,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let (incoming, outgoing): (Vec<TracedLink<'_>>, Vec<TracedLink<'_>>) =
            trace.links_of(item).partition(TracedLink::is_incoming);
        write_line!(
            out,
            newline,
            "{} - in:{}/{} out:{}/{} - {}",
            self.verdict(item.is_ok()),
            providing(&incoming),
            incoming.len(),
            providing(&outgoing),
            outgoing.len(),
            item.id()
        )?;

        if details {
            render_details(trace, item, newline, out)?;
        }
        Ok(())
    }

    fn render_summary(
        self,
        trace: &Trace,
        newline: Newline,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let defects = trace.defect_count();
        if defects == 0 {
            write_line!(out, newline, "{} - {} total", self.verdict(true), trace.len())
        } else {
            write_line!(
                out,
                newline,
                "{} - {} total, {} defect",
                self.verdict(false),
                trace.len(),
                defects
            )
        }
    }
}

fn providing(links: &[TracedLink<'_>]) -> usize {
    links
        .iter()
        .filter(|link| link.status().provides_coverage())
        .count()
}

fn render_details(
    trace: &Trace,
    item: &LinkedItem,
    newline: Newline,
    out: &mut dyn Write,
) -> io::Result<()> {
    if !item.uncovered().is_empty() {
        write_line!(out, newline, "  uncovered: {}", join(item.uncovered()))?;
    }
    if !item.over_covered().is_empty() {
        write_line!(out, newline, "  over-covered: {}", join(item.over_covered()))?;
    }

    for (direction, arrow) in [(Direction::Outgoing, "->"), (Direction::Incoming, "<-")] {
        for link in trace.sorted_links(item, direction) {
            if !link.status().provides_coverage() {
                write_line!(out, newline, "  {arrow} {} {}", link.status(), link.other_id())?;
            }
        }
    }
    Ok(())
}

fn join<'a>(types: impl IntoIterator<Item = &'a String>) -> String {
    types
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_diagnostics(trace: &Trace, newline: Newline, out: &mut dyn Write) -> io::Result<()> {
    for id in trace.duplicates() {
        write_line!(out, newline, "duplicate: {id}")?;
    }
    for cycle in trace.cycles() {
        let ids: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        write_line!(out, newline, "cycle: {}", ids.join(", "))?;
    }
    Ok(())
}

impl Renderer for PlainText {
    fn render(
        &self,
        trace: &Trace,
        verbosity: Verbosity,
        newline: Newline,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        match verbosity {
            Verbosity::Quiet => Ok(()),
            Verbosity::Minimal => write_line!(out, newline, "{}", self.verdict(trace.result())),
            Verbosity::Summary => self.render_summary(trace, newline, out),
            Verbosity::Failures => {
                for item in trace.defects() {
                    write_line!(out, newline, "{}", item.id())?;
                }
                Ok(())
            }
            Verbosity::FailureSummaries | Verbosity::FailureDetails | Verbosity::All => {
                let details = verbosity >= Verbosity::FailureDetails;
                for item in trace.items() {
                    if verbosity.failures_only() && item.is_ok() {
                        continue;
                    }
                    self.render_item(trace, item, details, newline, out)?;
                }
                if details {
                    render_diagnostics(trace, newline, out)?;
                }
                self.render_summary(trace, newline, out)
            }
        }
    }
}
