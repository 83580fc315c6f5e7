//! Links between specification items.
//!
//! A [`Link`] is derived from one authored [`Reference`]. Links are owned by
//! the [`Trace`](crate::Trace) in a flat arena and addressed by [`LinkId`];
//! both endpoints refer to the same link through that handle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Identifier, LinkKind, Reference};

/// Handle of an item inside a [`Trace`](crate::Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub(crate) usize);

impl ItemId {
    /// Position of the item in input order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle of a link inside a [`Trace`](crate::Trace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub(crate) usize);

/// Which end of a link an item is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    /// The item declared the reference.
    Outgoing,
    /// The item is the resolved target of the reference.
    Incoming,
}

/// Classification of a resolved (or unresolved) reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    /// The target needs the source's artifact type and is not rejected.
    Covers,
    /// The target resolved but has no coverage requirement to check for the
    /// source's artifact type.
    CoveredShallow,
    /// Several candidates share the winning rank.
    Ambiguous,
    /// The target is not the highest available revision.
    Outdated,
    /// No candidate exists.
    Orphaned,
}

impl LinkStatus {
    /// Upper-case name of the status, as used in reports and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Covers => "COVERS",
            Self::CoveredShallow => "COVERED_SHALLOW",
            Self::Ambiguous => "AMBIGUOUS",
            Self::Outdated => "OUTDATED",
            Self::Orphaned => "ORPHANED",
        }
    }

    /// Whether a link with this status provides coverage.
    #[must_use]
    pub const fn provides_coverage(self) -> bool {
        matches!(self, Self::Covers | Self::CoveredShallow)
    }

    /// Whether an outgoing link with this status fails the trace.
    #[must_use]
    pub const fn is_defect(self) -> bool {
        matches!(self, Self::Orphaned | Self::Ambiguous)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge from the item that declared a reference to the item it
/// resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub(crate) source: ItemId,
    pub(crate) target: Option<ItemId>,
    pub(crate) reference: Reference,
    pub(crate) status: LinkStatus,
}

impl Link {
    /// The item that declared the reference.
    #[must_use]
    pub const fn source(&self) -> ItemId {
        self.source
    }

    /// The resolved target, or `None` for orphaned references.
    #[must_use]
    pub const fn target(&self) -> Option<ItemId> {
        self.target
    }

    /// The identifier as it was authored (possibly a wildcard).
    #[must_use]
    pub const fn referenced_id(&self) -> &Identifier {
        &self.reference.target
    }

    /// The kind of relationship.
    #[must_use]
    pub const fn kind(&self) -> LinkKind {
        self.reference.kind
    }

    /// The link status.
    #[must_use]
    pub const fn status(&self) -> LinkStatus {
        self.status
    }
}
