use std::io::{self, Write};

use super::{Newline, Renderer, Verbosity};
use crate::{Direction, LinkedItem, Trace, TracedLink};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
section.sitem { border-left: 3px solid #4a4; padding-left: 0.5em; margin: 0.3em 0; }
section.sitem.defect { border-left-color: #c44; }
p.id { font-family: monospace; color: #666; }
ins { color: #c44; }
del { color: #888; }
";

/// A standalone HTML document with one collapsible section per item.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html;

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

impl Renderer for Html {
    fn render(
        &self,
        trace: &Trace,
        verbosity: Verbosity,
        newline: Newline,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        if verbosity == Verbosity::Quiet {
            return Ok(());
        }

        write_line!(out, newline, "<!DOCTYPE html>")?;
        write_line!(out, newline, "<html lang=\"en\">")?;
        write_line!(out, newline, "<head>")?;
        write_line!(out, newline, "  <meta charset=\"utf-8\">")?;
        write_line!(out, newline, "  <title>Specification items</title>")?;
        write_line!(out, newline, "  <style>")?;
        for rule in STYLE.lines() {
            write_line!(out, newline, "{rule}")?;
        }
        write_line!(out, newline, "  </style>")?;
        write_line!(out, newline, "</head>")?;
        write_line!(out, newline, "<body>")?;
        render_summary(trace, newline, out)?;

        if verbosity >= Verbosity::Failures {
            for item in trace.items() {
                if verbosity.failures_only() && item.is_ok() {
                    continue;
                }
                render_item(trace, item, newline, out)?;
            }
        }

        write_line!(out, newline, "</body>")?;
        write_line!(out, newline, "</html>")
    }
}

fn render_summary(trace: &Trace, newline: Newline, out: &mut dyn Write) -> io::Result<()> {
    let defects = trace.defect_count();
    if defects == 0 {
        write_line!(out, newline, "<h1>ok - {} total</h1>", trace.len())
    } else {
        write_line!(
            out,
            newline,
            "<h1>not ok - {} total, {} defect</h1>",
            trace.len(),
            defects
        )
    }
}

fn render_item(
    trace: &Trace,
    item: &LinkedItem,
    newline: Newline,
    out: &mut dyn Write,
) -> io::Result<()> {
    let id = html_escape(&item.id().to_string());
    let class = if item.is_ok() { "sitem" } else { "sitem defect" };
    let mark = if item.is_ok() { '\u{2714}' } else { '\u{2718}' };
    let revision = item
        .id()
        .revision()
        .map_or_else(|| "-".to_string(), |revision| revision.to_string());

    write_line!(out, newline, "<section class=\"{class}\" id=\"{id}\">")?;
    write_line!(out, newline, "  <details>")?;
    write_line!(
        out,
        newline,
        "    <summary title=\"{id}\">{mark} <b>{}</b><small>, rev. {revision}, {}</small></summary>",
        html_escape(item.item().title_or_name()),
        html_escape(item.id().artifact_type()),
    )?;
    write_line!(out, newline, "    <p class=\"id\">{id}</p>")?;

    if let Some(description) = item.item().description() {
        render_paragraphs(description, newline, out)?;
    }
    if let Some(rationale) = item.item().rationale() {
        write_line!(out, newline, "    <h6>Rationale:</h6>")?;
        render_paragraphs(rationale, newline, out)?;
    }
    if let Some(comment) = item.item().comment() {
        write_line!(out, newline, "    <h6>Comment:</h6>")?;
        render_paragraphs(comment, newline, out)?;
    }

    render_needs(item, newline, out)?;
    for (direction, heading, class) in [
        (Direction::Outgoing, "Out", "out"),
        (Direction::Incoming, "In", "in"),
    ] {
        let links = trace.sorted_links(item, direction);
        render_links(heading, class, &links, newline, out)?;
    }

    write_line!(out, newline, "  </details>")?;
    write_line!(out, newline, "</section>")
}

fn render_paragraphs(text: &str, newline: Newline, out: &mut dyn Write) -> io::Result<()> {
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        write_line!(out, newline, "    <p>{}</p>", html_escape(line))?;
    }
    Ok(())
}

/// Needed, covered and over-covered types in one line, sorted by type name.
/// Uncovered types are marked as insertions, over-covered ones as deletions.
fn render_needs(item: &LinkedItem, newline: Newline, out: &mut dyn Write) -> io::Result<()> {
    let mut types: Vec<(&str, String)> = item
        .uncovered()
        .iter()
        .map(|t| (t.as_str(), format!("<ins>{}</ins>", html_escape(t))))
        .chain(item.covered().iter().map(|t| (t.as_str(), html_escape(t))))
        .chain(
            item.over_covered()
                .iter()
                .map(|t| (t.as_str(), format!("<del>{}</del>", html_escape(t)))),
        )
        .collect();

    if types.is_empty() {
        return Ok(());
    }
    types.sort_by_key(|(name, _)| *name);

    let rendered: Vec<String> = types.into_iter().map(|(_, html)| html).collect();
    write_line!(out, newline, "    <h6>Needs: {}</h6>", rendered.join(", "))
}

fn render_links(
    heading: &str,
    class: &str,
    links: &[TracedLink<'_>],
    newline: Newline,
    out: &mut dyn Write,
) -> io::Result<()> {
    if links.is_empty() {
        return Ok(());
    }

    write_line!(out, newline, "    <h6>{heading}: {} total</h6>", links.len())?;
    write_line!(out, newline, "    <ul class=\"{class}\">")?;
    for link in links {
        let other = html_escape(&link.other_id().to_string());
        write!(out, "      <li><a href=\"#{other}\">{other}</a>")?;
        if !link.status().provides_coverage() {
            write!(out, " <em>({})</em>", link.status())?;
        }
        write_line!(out, newline, "</li>")?;
    }
    write_line!(out, newline, "    </ul>")
}
