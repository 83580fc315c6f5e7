// Serialized record types for the machine-readable export format.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Direction, IdentifierError, MalformedInputError},
    Identifier, ItemStatus, LinkKind, LinkStatus, LinkedItem, SpecificationItem, Trace,
};

/// The serialized form of an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRecord {
    /// Item name.
    pub name: String,
    /// Artifact type.
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// Revision, omitted when unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

impl From<&Identifier> for IdRecord {
    fn from(id: &Identifier) -> Self {
        Self {
            name: id.name().to_string(),
            artifact_type: id.artifact_type().to_string(),
            revision: id.revision(),
        }
    }
}

impl TryFrom<IdRecord> for Identifier {
    type Error = IdentifierError;

    fn try_from(record: IdRecord) -> Result<Self, Self::Error> {
        Self::from_parts(record.name, record.artifact_type, record.revision)
    }
}

/// The serialized form of one outgoing link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The referenced identifier, as authored.
    pub target: IdRecord,
    /// The kind of relationship.
    #[serde(default)]
    pub kind: LinkKind,
    /// The resolved status. Informational on import: statuses are always
    /// recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LinkStatus>,
}

/// One linked specification item in the export format.
///
/// The derived fields (`covered`, `uncovered`, `over_covered` and link
/// statuses) are written on export and ignored on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// The item's identifier.
    pub id: IdRecord,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ItemStatus,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Needed artifact types.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub needs: BTreeSet<String>,
    /// Needed types that are covered.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub covered: BTreeSet<String>,
    /// Needed types that are not covered.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub uncovered: BTreeSet<String>,
    /// Types covering the item without being needed.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub over_covered: BTreeSet<String>,
    /// Outgoing links, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkRecord>,
}

impl ExportRecord {
    /// Build the record of a linked item.
    ///
    /// Needs are written merged with the configured needs table, so a record
    /// carries everything required to re-trace it.
    #[must_use]
    pub fn new(trace: &Trace, linked: &LinkedItem) -> Self {
        let item = linked.item();
        let links = trace
            .links_of(linked)
            .filter(|link| link.direction() == Direction::Outgoing)
            .map(|link| LinkRecord {
                target: link.link().referenced_id().into(),
                kind: link.link().kind(),
                status: Some(link.status()),
            })
            .collect();

        Self {
            id: item.id().into(),
            title: item.title().map(str::to_string),
            status: item.status(),
            description: item.description().map(str::to_string),
            rationale: item.rationale().map(str::to_string),
            comment: item.comment().map(str::to_string),
            needs: linked.needed().clone(),
            covered: linked.covered().clone(),
            uncovered: linked.uncovered().clone(),
            over_covered: linked.over_covered().clone(),
            links,
        }
    }
}

impl TryFrom<ExportRecord> for SpecificationItem {
    type Error = MalformedInputError;

    fn try_from(record: ExportRecord) -> Result<Self, Self::Error> {
        let mut builder = Self::builder(record.id.try_into()?).status(record.status);

        if let Some(title) = record.title {
            builder = builder.title(title);
        }
        if let Some(description) = record.description {
            builder = builder.description(description);
        }
        if let Some(rationale) = record.rationale {
            builder = builder.rationale(rationale);
        }
        if let Some(comment) = record.comment {
            builder = builder.comment(comment);
        }
        for need in record.needs {
            builder = builder.needs(need);
        }
        for link in record.links {
            builder = builder.reference(link.target.try_into()?, link.kind);
        }

        Ok(builder.build()?)
    }
}

/// The serialized versions of an export document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub(super) enum Document {
    #[serde(rename = "1")]
    V1 { items: Vec<ExportRecord> },
}

impl Document {
    pub fn into_records(self) -> Vec<ExportRecord> {
        match self {
            Self::V1 { items } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_record_omits_unspecified_revision() {
        let id: Identifier = "req~Req-1".parse().unwrap();
        let json = serde_json::to_string(&IdRecord::from(&id)).unwrap();
        assert_eq!(json, r#"{"name":"Req-1","type":"req"}"#);
    }

    #[test]
    fn record_with_empty_name_is_malformed() {
        let record = ExportRecord {
            id: IdRecord {
                name: String::new(),
                artifact_type: "req".to_string(),
                revision: Some(0),
            },
            title: None,
            status: ItemStatus::Approved,
            description: None,
            rationale: None,
            comment: None,
            needs: BTreeSet::new(),
            covered: BTreeSet::new(),
            uncovered: BTreeSet::new(),
            over_covered: BTreeSet::new(),
            links: Vec::new(),
        };

        let error = SpecificationItem::try_from(record).unwrap_err();
        assert!(matches!(
            error,
            MalformedInputError::Identifier(IdentifierError::Name(_))
        ));
    }

    #[test]
    fn minimal_record_uses_defaults() {
        let record: ExportRecord =
            serde_json::from_str(r#"{"id":{"name":"Req-1","type":"req","revision":2}}"#).unwrap();
        let item = SpecificationItem::try_from(record).unwrap();

        assert_eq!(item.id().to_string(), "req~Req-1~2");
        assert_eq!(item.status(), ItemStatus::Approved);
        assert!(item.references().is_empty());
    }

    #[test]
    fn link_kind_defaults_to_covers() {
        let record: LinkRecord =
            serde_json::from_str(r#"{"target":{"name":"Req-1","type":"req"}}"#).unwrap();
        assert_eq!(record.kind, LinkKind::Covers);
        assert_eq!(record.status, None);
    }
}
