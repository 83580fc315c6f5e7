//! Specobject XML.
//!
//! Items are grouped into one `<specobjects doctype="...">` element per
//! artifact type, types sorted by name, items in input order. Only authored
//! data is written: link statuses and coverage are left to the consumer.

use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{LinkKind, LinkedItem, Trace};

struct SpecobjectWriter<'w> {
    xml: Writer<&'w mut dyn Write>,
}

impl<'w> SpecobjectWriter<'w> {
    fn new(out: &'w mut dyn Write) -> Self {
        Self {
            xml: Writer::new_with_indent(out, b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> io::Result<()> {
        self.xml.write_event(event).map_err(io::Error::other)
    }

    fn start(&mut self, element: BytesStart<'_>) -> io::Result<()> {
        self.event(Event::Start(element))
    }

    fn end(&mut self, name: &str) -> io::Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// `<name>text</name>`, text escaped.
    fn text_element(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.start(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn item(&mut self, linked: &LinkedItem) -> io::Result<()> {
        let item = linked.item();
        let id = item.id();

        self.start(BytesStart::new("specobject"))?;
        self.text_element("id", id.name())?;
        self.text_element("status", item.status().as_str())?;
        if let Some(revision) = id.revision() {
            self.text_element("version", &revision.to_string())?;
        }
        if let Some(title) = item.title() {
            self.text_element("shortdesc", title)?;
        }
        if let Some(description) = item.description() {
            self.text_element("description", description)?;
        }
        if let Some(rationale) = item.rationale() {
            self.text_element("rationale", rationale)?;
        }
        if let Some(comment) = item.comment() {
            self.text_element("comment", comment)?;
        }

        if !linked.needed().is_empty() {
            self.start(BytesStart::new("needscoverage"))?;
            for artifact_type in linked.needed() {
                self.text_element("needsobj", artifact_type)?;
            }
            self.end("needscoverage")?;
        }

        let (covers, depends): (Vec<_>, Vec<_>) = item
            .references()
            .iter()
            .partition(|reference| reference.kind == LinkKind::Covers);

        if !covers.is_empty() {
            self.start(BytesStart::new("providescoverage"))?;
            for reference in covers {
                let target = &reference.target;
                self.start(BytesStart::new("provcov"))?;
                self.text_element(
                    "linksto",
                    &format!("{}:{}", target.artifact_type(), target.name()),
                )?;
                if let Some(revision) = target.revision() {
                    self.text_element("dstversion", &revision.to_string())?;
                }
                self.end("provcov")?;
            }
            self.end("providescoverage")?;
        }

        if !depends.is_empty() {
            self.start(BytesStart::new("dependencies"))?;
            for reference in depends {
                self.text_element("dependson", &reference.target.to_string())?;
            }
            self.end("dependencies")?;
        }

        self.end("specobject")
    }
}

/// Write `trace` as a specobject document.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_specobject(trace: &Trace, out: &mut dyn Write) -> io::Result<()> {
    let mut by_type: BTreeMap<&str, Vec<&LinkedItem>> = BTreeMap::new();
    for linked in trace.items() {
        by_type
            .entry(linked.id().artifact_type())
            .or_default()
            .push(linked);
    }

    let mut writer = SpecobjectWriter::new(out);
    writer.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.start(BytesStart::new("specdocument"))?;
    for (artifact_type, items) in by_type {
        let mut group = BytesStart::new("specobjects");
        group.push_attribute(("doctype", artifact_type));
        writer.start(group)?;
        for linked in items {
            writer.item(linked)?;
        }
        writer.end("specobjects")?;
    }
    writer.end("specdocument")?;

    writeln!(writer.xml.get_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Identifier, ItemStatus, SpecificationItem};

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    fn render(items: Vec<SpecificationItem>, config: &Config) -> String {
        let trace = Trace::build(items, config).unwrap();
        let mut out = Vec::new();
        write_specobject(&trace, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn groups_items_by_artifact_type() {
        let xml = render(
            vec![
                SpecificationItem::builder(id("req~Req-1~0")).build().unwrap(),
                SpecificationItem::builder(id("dsn~Dsn-1~0")).build().unwrap(),
                SpecificationItem::builder(id("req~Req-2~0")).build().unwrap(),
            ],
            &Config::default(),
        );

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.ends_with("</specdocument>\n"));
        let dsn = xml.find("<specobjects doctype=\"dsn\">").unwrap();
        let req = xml.find("<specobjects doctype=\"req\">").unwrap();
        assert!(dsn < req);
        assert!(xml.find("<id>Req-1</id>").unwrap() < xml.find("<id>Req-2</id>").unwrap());
    }

    #[test]
    fn writes_item_fields_and_references() {
        let mut config = Config::default();
        config.add_need("dsn", "utest");

        let xml = render(
            vec![
                SpecificationItem::builder(id("dsn~Dsn-1~2"))
                    .title("Login & <logout>")
                    .description("Both ways.")
                    .status(ItemStatus::Draft)
                    .needs("impl")
                    .covers(id("req~Req-1~1"))
                    .covers(id("req~Req-2"))
                    .depends_on(id("dsn~Base~0"))
                    .build()
                    .unwrap(),
            ],
            &config,
        );

        assert!(xml.contains("<id>Dsn-1</id>"));
        assert!(xml.contains("<status>draft</status>"));
        assert!(xml.contains("<version>2</version>"));
        assert!(xml.contains("<shortdesc>Login &amp; &lt;logout&gt;</shortdesc>"));
        assert!(xml.contains("<description>Both ways.</description>"));
        assert!(xml.contains("<needsobj>impl</needsobj>"));
        assert!(xml.contains("<needsobj>utest</needsobj>"));
        assert!(xml.contains("<linksto>req:Req-1</linksto>"));
        assert!(xml.contains("<dstversion>1</dstversion>"));
        assert!(xml.contains("<linksto>req:Req-2</linksto>"));
        assert_eq!(xml.matches("<dstversion>").count(), 1);
        assert!(xml.contains("<dependson>dsn~Base~0</dependson>"));
    }

    #[test]
    fn omits_empty_sections() {
        let xml = render(
            vec![SpecificationItem::builder(id("req~Req-1~0")).build().unwrap()],
            &Config::default(),
        );

        assert!(!xml.contains("<needscoverage>"));
        assert!(!xml.contains("<providescoverage>"));
        assert!(!xml.contains("<dependencies>"));
        assert!(!xml.contains("<shortdesc>"));
    }
}
