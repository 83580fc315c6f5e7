//! Reference resolution.
//!
//! The [`Resolver`] indexes a snapshot of specification items by name and
//! artifact type, then resolves each authored reference to a target item and
//! classifies the resulting link. The index is built completely before any
//! reference is resolved and is read-only afterwards, so resolution of
//! independent items runs in parallel.

use std::collections::{BTreeMap, BTreeSet};

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;

use crate::domain::{
    Identifier, ItemStatus, LinkKind, LinkStatus, Reference, SpecificationItem,
};

/// The outcome of resolving one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Index of the chosen target in input order.
    pub target: Option<usize>,
    pub status: LinkStatus,
}

/// Read-only lookup structure over a snapshot of items.
#[derive(Debug)]
pub struct Resolver<'a> {
    items: &'a [SpecificationItem],

    /// Needed artifact types of each item (own needs merged with the
    /// configured needs table), by input position.
    needed: &'a [BTreeSet<String>],

    /// `(name, artifact type)` → candidate positions, in input order.
    /// Duplicated identifiers are all kept.
    candidates: BTreeMap<(&'a str, &'a str), Vec<usize>>,
}

impl<'a> Resolver<'a> {
    pub fn new(items: &'a [SpecificationItem], needed: &'a [BTreeSet<String>]) -> Self {
        debug_assert_eq!(items.len(), needed.len());

        let mut candidates: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
        for (index, item) in items.iter().enumerate() {
            candidates
                .entry((item.id().name(), item.id().artifact_type()))
                .or_default()
                .push(index);
        }

        Self {
            items,
            needed,
            candidates,
        }
    }

    /// Resolve every reference of every item.
    ///
    /// The outer vector is in input order, each inner vector in declaration
    /// order, so the output is the same as a sequential run.
    #[instrument(level = "debug", skip_all, fields(items = self.items.len()))]
    pub fn resolve_all(&self) -> Vec<Vec<Resolution>> {
        self.items
            .par_iter()
            .enumerate()
            .map(|(source, item)| {
                item.references()
                    .iter()
                    .map(|reference| self.resolve(source, reference))
                    .collect()
            })
            .collect()
    }

    /// Resolve a single reference declared by the item at `source`.
    pub fn resolve(&self, source: usize, reference: &Reference) -> Resolution {
        let wanted = &reference.target;

        let Some(candidates) = self
            .candidates
            .get(&(wanted.name(), wanted.artifact_type()))
        else {
            return Resolution {
                target: None,
                status: LinkStatus::Orphaned,
            };
        };

        let highest = candidates
            .iter()
            .map(|&index| self.items[index].id().rank())
            .max()
            .unwrap_or_default();

        // Candidates sharing the winning rank, in input order.
        let winners: Vec<usize> = wanted.revision().map_or_else(
            || {
                candidates
                    .iter()
                    .copied()
                    .filter(|&index| self.items[index].id().rank() == highest)
                    .collect()
            },
            |revision| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&index| self.items[index].id().revision() == Some(revision))
                    .collect()
            },
        );

        let Some(&target) = winners.first() else {
            tracing::trace!("no revision of {wanted} matches exactly");
            return Resolution {
                target: None,
                status: LinkStatus::Orphaned,
            };
        };

        let status = if winners.len() > 1 {
            LinkStatus::Ambiguous
        } else if self.items[target].id().rank() < highest {
            LinkStatus::Outdated
        } else if self.requires_coverage(source, target, reference.kind) {
            LinkStatus::Covers
        } else {
            LinkStatus::CoveredShallow
        };

        Resolution {
            target: Some(target),
            status,
        }
    }

    /// Whether `target` needs coverage from `source`'s artifact type.
    fn requires_coverage(&self, source: usize, target: usize, kind: LinkKind) -> bool {
        let source_type = self.items[source].id().artifact_type();
        kind == LinkKind::Covers
            && self.items[target].status() != ItemStatus::Rejected
            && self.needed[target].contains(source_type)
    }

    /// Identifiers declared by more than one item, sorted.
    pub fn duplicates(&self) -> Vec<Identifier> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for item in self.items {
            if !seen.insert(item.id()) {
                duplicates.insert(item.id().clone());
            }
        }
        duplicates.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    fn item(s: &str) -> SpecificationItem {
        SpecificationItem::builder(id(s)).build().unwrap()
    }

    fn needed(items: &[SpecificationItem]) -> Vec<BTreeSet<String>> {
        items.iter().map(|item| item.needs().clone()).collect()
    }

    fn resolve_one(items: &[SpecificationItem], source: usize, target: &str) -> Resolution {
        let needed = needed(items);
        let resolver = Resolver::new(items, &needed);
        resolver.resolve(
            source,
            &Reference {
                target: id(target),
                kind: LinkKind::Covers,
            },
        )
    }

    #[test]
    fn wildcard_selects_highest_revision() {
        let items = vec![
            item("dsn~D~0"),
            item("req~R~1"),
            item("req~R~3"),
            item("req~R~2"),
        ];

        let resolution = resolve_one(&items, 0, "req~R");
        assert_eq!(resolution.target, Some(2));
        assert_eq!(resolution.status, LinkStatus::CoveredShallow);
    }

    #[test]
    fn explicit_revision_requires_exact_match() {
        let items = vec![item("dsn~D~0"), item("req~R~1"), item("req~R~2")];

        let exact = resolve_one(&items, 0, "req~R~2");
        assert_eq!(exact.target, Some(2));

        let missing = resolve_one(&items, 0, "req~R~5");
        assert_eq!(missing.target, None);
        assert_eq!(missing.status, LinkStatus::Orphaned);
    }

    #[test]
    fn lower_revision_is_outdated() {
        let items = vec![item("dsn~D~0"), item("req~R~1"), item("req~R~2")];

        let resolution = resolve_one(&items, 0, "req~R~1");
        assert_eq!(resolution.target, Some(1));
        assert_eq!(resolution.status, LinkStatus::Outdated);
    }

    #[test]
    fn unknown_item_is_orphaned() {
        let items = vec![item("dsn~D~0")];

        let resolution = resolve_one(&items, 0, "req~Nope~0");
        assert_eq!(
            resolution,
            Resolution {
                target: None,
                status: LinkStatus::Orphaned
            }
        );
    }

    #[test]
    fn tied_wildcard_candidates_are_ambiguous_and_first_wins() {
        let items = vec![
            item("dsn~D~0"),
            item("req~R~2"),
            item("req~R~1"),
            item("req~R~2"),
        ];

        let resolution = resolve_one(&items, 0, "req~R");
        assert_eq!(resolution.target, Some(1));
        assert_eq!(resolution.status, LinkStatus::Ambiguous);
    }

    #[test]
    fn duplicated_exact_identifier_is_ambiguous() {
        let items = vec![item("dsn~D~0"), item("req~R~0"), item("req~R~0")];

        let resolution = resolve_one(&items, 0, "req~R~0");
        assert_eq!(resolution.target, Some(1));
        assert_eq!(resolution.status, LinkStatus::Ambiguous);
    }

    #[test]
    fn needed_type_makes_link_covering() {
        let items = vec![
            item("dsn~D~0"),
            SpecificationItem::builder(id("req~R~0"))
                .needs("dsn")
                .build()
                .unwrap(),
        ];

        assert_eq!(resolve_one(&items, 0, "req~R~0").status, LinkStatus::Covers);
    }

    #[test]
    fn rejected_target_is_shallow() {
        let items = vec![
            item("dsn~D~0"),
            SpecificationItem::builder(id("req~R~0"))
                .needs("dsn")
                .status(ItemStatus::Rejected)
                .build()
                .unwrap(),
        ];

        assert_eq!(
            resolve_one(&items, 0, "req~R~0").status,
            LinkStatus::CoveredShallow
        );
    }

    #[test]
    fn dependency_never_covers() {
        let items = vec![
            item("dsn~D~0"),
            SpecificationItem::builder(id("req~R~0"))
                .needs("dsn")
                .build()
                .unwrap(),
        ];
        let needed = needed(&items);
        let resolver = Resolver::new(&items, &needed);

        let resolution = resolver.resolve(
            0,
            &Reference {
                target: id("req~R~0"),
                kind: LinkKind::DependsOn,
            },
        );
        assert_eq!(resolution.status, LinkStatus::CoveredShallow);
    }

    #[test]
    fn resolve_all_preserves_order() {
        let items = vec![
            SpecificationItem::builder(id("dsn~D~0"))
                .covers(id("req~B~0"))
                .covers(id("req~Missing~0"))
                .covers(id("req~A~0"))
                .build()
                .unwrap(),
            item("req~A~0"),
            item("req~B~0"),
        ];
        let needed = needed(&items);
        let resolver = Resolver::new(&items, &needed);

        let resolutions = resolver.resolve_all();
        assert_eq!(resolutions.len(), 3);
        let targets: Vec<_> = resolutions[0].iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![Some(2), None, Some(1)]);
        assert!(resolutions[1].is_empty());
        assert!(resolutions[2].is_empty());
    }

    #[test]
    fn reports_duplicates_once() {
        let items = vec![
            item("req~R~0"),
            item("req~R~0"),
            item("req~R~0"),
            item("req~R~1"),
        ];
        let needed = needed(&items);
        let resolver = Resolver::new(&items, &needed);

        assert_eq!(resolver.duplicates(), vec![id("req~R~0")]);
    }
}
