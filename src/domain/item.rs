use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::Identifier;

/// A specification item is an authored unit of a specification.
///
/// It can represent a requirement, a design element, an implementation, a
/// test, etc. Items declare references to other items (e.g. a design item
/// covering a requirement) and the artifact types they need coverage from.
///
/// Items are immutable once built. Use [`SpecificationItem::builder`] to
/// construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificationItem {
    id: Identifier,
    title: Option<String>,
    description: Option<String>,
    rationale: Option<String>,
    comment: Option<String>,
    status: ItemStatus,
    references: Vec<Reference>,
    needs: BTreeSet<String>,
}

/// Lifecycle status of a specification item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Accepted for implementation.
    #[default]
    Approved,
    /// Suggested, not yet accepted.
    Proposed,
    /// Work in progress.
    Draft,
    /// Not going to be implemented.
    Rejected,
}

impl ItemStatus {
    /// Lower-case name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Proposed => "proposed",
            Self::Draft => "draft",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ItemStatus`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown item status '{0}'")]
pub struct UnknownStatusError(String);

impl FromStr for ItemStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "proposed" => Ok(Self::Proposed),
            "draft" => Ok(Self::Draft),
            "rejected" => Ok(Self::Rejected),
            _ => Err(UnknownStatusError(s.to_string())),
        }
    }
}

/// How a reference relates the declaring item to its target.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// The declaring item covers the target.
    #[default]
    Covers,
    /// The declaring item depends on the target.
    ///
    /// Dependencies are resolved and classified, but never provide coverage.
    #[serde(rename = "depends")]
    DependsOn,
}

impl LinkKind {
    /// Lower-case name of the link kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Covers => "covers",
            Self::DependsOn => "depends",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing reference as authored: the target identifier and link kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reference {
    /// The referenced identifier. May be a wildcard.
    pub target: Identifier,
    /// The kind of relationship.
    pub kind: LinkKind,
}

/// Error returned when building a [`SpecificationItem`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("item {item} declares an empty needed artifact type")]
pub struct EmptyNeedError {
    /// The offending item.
    pub item: Identifier,
}

impl SpecificationItem {
    /// Start building an item with the given identifier.
    pub fn builder(id: Identifier) -> Builder {
        Builder {
            item: Self {
                id,
                title: None,
                description: None,
                rationale: None,
                comment: None,
                status: ItemStatus::default(),
                references: Vec::new(),
                needs: BTreeSet::new(),
            },
        }
    }

    /// The item's identifier.
    #[must_use]
    pub const fn id(&self) -> &Identifier {
        &self.id
    }

    /// The title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The title, falling back to the item name.
    #[must_use]
    pub fn title_or_name(&self) -> &str {
        self.title().unwrap_or_else(|| self.id.name())
    }

    /// The description. May span several lines.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The rationale.
    #[must_use]
    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    /// The comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ItemStatus {
        self.status
    }

    /// Outgoing references, in declaration order.
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Artifact types this item declares it needs coverage from.
    #[must_use]
    pub const fn needs(&self) -> &BTreeSet<String> {
        &self.needs
    }
}

/// Builder for [`SpecificationItem`].
#[derive(Debug, Clone)]
#[must_use]
pub struct Builder {
    item: SpecificationItem,
}

impl Builder {
    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.item.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.item.description = Some(description.into());
        self
    }

    /// Set the rationale.
    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.item.rationale = Some(rationale.into());
        self
    }

    /// Set the comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.item.comment = Some(comment.into());
        self
    }

    /// Set the lifecycle status.
    pub const fn status(mut self, status: ItemStatus) -> Self {
        self.item.status = status;
        self
    }

    /// Declare that this item covers `target`.
    pub fn covers(self, target: Identifier) -> Self {
        self.reference(target, LinkKind::Covers)
    }

    /// Declare that this item depends on `target`.
    pub fn depends_on(self, target: Identifier) -> Self {
        self.reference(target, LinkKind::DependsOn)
    }

    /// Add an outgoing reference.
    pub fn reference(mut self, target: Identifier, kind: LinkKind) -> Self {
        self.item.references.push(Reference { target, kind });
        self
    }

    /// Declare an artifact type this item needs coverage from.
    pub fn needs(mut self, artifact_type: impl Into<String>) -> Self {
        self.item.needs.insert(artifact_type.into());
        self
    }

    /// Finish building the item.
    ///
    /// # Errors
    ///
    /// Returns an error if an empty needed artifact type was declared.
    pub fn build(self) -> Result<SpecificationItem, EmptyNeedError> {
        if self.item.needs.iter().any(String::is_empty) {
            return Err(EmptyNeedError { item: self.item.id });
        }
        Ok(self.item)
    }
}
