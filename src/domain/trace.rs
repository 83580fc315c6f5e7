//! The result of tracing a set of specification items.
//!
//! A [`Trace`] owns every [`LinkedItem`] and every [`Link`]. Items refer to
//! their links through [`LinkId`] handles into the trace's link arena, so a
//! link is shared by both of its endpoints without either owning it.
//!
//! A trace is built once and never mutated. It can be shared between
//! renderers running on different threads.

use std::collections::BTreeSet;

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    coverage::Coverage,
    link::{Direction, ItemId, Link, LinkId, LinkStatus},
    resolver::Resolver,
    Config, EmptyNeedError, Identifier, IdentifierError, LinkKind, SpecificationItem,
};

/// Structural errors that abort tracing.
///
/// No partial trace is produced when one of these occurs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedInputError {
    /// An identifier violates its invariants.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    /// An item declares an empty needed artifact type.
    #[error(transparent)]
    EmptyNeed(#[from] EmptyNeedError),
    /// The configured needs table contains an empty artifact type.
    #[error("needs table entry for '{0}' contains an empty artifact type")]
    NeedsTable(String),
}

/// A specification item together with its resolved links and coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedItem {
    id: ItemId,
    item: SpecificationItem,
    needed: BTreeSet<String>,
    links: Vec<(LinkId, Direction)>,
    coverage: Coverage,
    incoming: usize,
    outgoing: usize,
    defective_links: bool,
}

impl LinkedItem {
    /// Handle of this item in its trace.
    #[must_use]
    pub const fn handle(&self) -> ItemId {
        self.id
    }

    /// The authored item.
    #[must_use]
    pub const fn item(&self) -> &SpecificationItem {
        &self.item
    }

    /// The item's identifier.
    #[must_use]
    pub const fn id(&self) -> &Identifier {
        self.item.id()
    }

    /// Needed artifact types: the item's own needs merged with the configured
    /// needs table entry for its artifact type.
    #[must_use]
    pub const fn needed(&self) -> &BTreeSet<String> {
        &self.needed
    }

    /// The coverage classification.
    #[must_use]
    pub const fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Needed types that are covered.
    #[must_use]
    pub const fn covered(&self) -> &BTreeSet<String> {
        self.coverage.covered()
    }

    /// Needed types that are not covered.
    #[must_use]
    pub const fn uncovered(&self) -> &BTreeSet<String> {
        self.coverage.uncovered()
    }

    /// Types covering this item without being needed.
    #[must_use]
    pub const fn over_covered(&self) -> &BTreeSet<String> {
        self.coverage.over_covered()
    }

    /// Link handles with the direction as seen from this item, in
    /// construction order.
    #[must_use]
    pub fn link_handles(&self) -> &[(LinkId, Direction)] {
        &self.links
    }

    /// Number of incoming links.
    #[must_use]
    pub const fn incoming_count(&self) -> usize {
        self.incoming
    }

    /// Number of outgoing links.
    #[must_use]
    pub const fn outgoing_count(&self) -> usize {
        self.outgoing
    }

    /// Whether the item is adequately covered: nothing uncovered and no
    /// orphaned or ambiguous outgoing link.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.coverage.is_complete() && !self.defective_links
    }

    /// Whether the item is a defect. The opposite of [`Self::is_ok`].
    #[must_use]
    pub fn is_defect(&self) -> bool {
        !self.is_ok()
    }
}

/// A link seen from one of its endpoints.
#[derive(Debug, Clone, Copy)]
pub struct TracedLink<'a> {
    handle: LinkId,
    link: &'a Link,
    direction: Direction,
    other_id: &'a Identifier,
}

impl<'a> TracedLink<'a> {
    /// Handle of the shared link.
    #[must_use]
    pub const fn handle(&self) -> LinkId {
        self.handle
    }

    /// The shared link.
    #[must_use]
    pub const fn link(&self) -> &'a Link {
        self.link
    }

    /// Direction as seen from the item the link was obtained from.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the link was declared by the viewing item.
    #[must_use]
    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }

    /// Whether the viewing item is the link's target.
    #[must_use]
    pub fn is_incoming(&self) -> bool {
        self.direction == Direction::Incoming
    }

    /// The link status. Identical from both ends.
    #[must_use]
    pub const fn status(&self) -> LinkStatus {
        self.link.status
    }

    /// Identifier of the other end.
    ///
    /// For an orphaned outgoing link this is the authored reference.
    #[must_use]
    pub const fn other_id(&self) -> &'a Identifier {
        self.other_id
    }

    /// Handle of the other end, or `None` for an orphaned outgoing link.
    #[must_use]
    pub const fn other(&self) -> Option<ItemId> {
        match self.direction {
            Direction::Outgoing => self.link.target,
            Direction::Incoming => Some(self.link.source),
        }
    }
}

/// The complete, immutable result of linking and classifying items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    items: Vec<LinkedItem>,
    links: Vec<Link>,
    duplicates: Vec<Identifier>,
    cycles: Vec<Vec<Identifier>>,
    result: bool,
}

impl Trace {
    /// Resolve the references of `items` and classify their coverage.
    ///
    /// Items keep their input order. Duplicated identifiers are tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError::NeedsTable`] if the configured needs
    /// table contains an empty artifact type.
    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub fn build(
        items: Vec<SpecificationItem>,
        config: &Config,
    ) -> Result<Self, MalformedInputError> {
        if let Some(artifact_type) = config.find_empty_type() {
            return Err(MalformedInputError::NeedsTable(artifact_type.to_string()));
        }

        let needed: Vec<BTreeSet<String>> = items
            .iter()
            .map(|item| {
                let mut needed = item.needs().clone();
                needed.extend(config.needs_for(item.id().artifact_type()).iter().cloned());
                needed
            })
            .collect();

        let resolver = Resolver::new(&items, &needed);
        let resolutions = resolver.resolve_all();
        let duplicates = resolver.duplicates();

        let mut links = Vec::new();
        let mut handles: Vec<Vec<(LinkId, Direction)>> = vec![Vec::new(); items.len()];

        for (source, (item, resolved)) in items.iter().zip(resolutions).enumerate() {
            for (reference, resolution) in item.references().iter().zip(resolved) {
                let handle = LinkId(links.len());
                links.push(Link {
                    source: ItemId(source),
                    target: resolution.target.map(ItemId),
                    reference: reference.clone(),
                    status: resolution.status,
                });

                handles[source].push((handle, Direction::Outgoing));
                if let Some(target) = resolution.target {
                    handles[target].push((handle, Direction::Incoming));
                }
            }
        }

        let cycles = find_cycles(&items, &links);

        // Coverage of an item is provided by the items covering it, i.e. the
        // sources of its incoming `covers` links.
        let coverage: Vec<Coverage> = handles
            .iter()
            .zip(&needed)
            .map(|(links_of_item, needed)| {
                let provided = links_of_item.iter().filter_map(|&(handle, direction)| {
                    let link = &links[handle.0];
                    (direction == Direction::Incoming
                        && link.reference.kind == LinkKind::Covers
                        && link.status.provides_coverage())
                    .then(|| items[link.source.0].id().artifact_type())
                });
                Coverage::classify(needed, provided)
            })
            .collect();

        let items: Vec<LinkedItem> = items
            .into_iter()
            .zip(needed)
            .zip(handles)
            .zip(coverage)
            .enumerate()
            .map(|(index, (((item, needed), links_of_item), coverage))| {
                link_item(ItemId(index), item, needed, links_of_item, coverage, &links)
            })
            .collect();

        let result = items.iter().all(LinkedItem::is_ok);

        tracing::debug!(
            links = links.len(),
            duplicates = duplicates.len(),
            cycles = cycles.len(),
            result,
            "trace complete"
        );

        Ok(Self {
            items,
            links,
            duplicates,
            cycles,
            result,
        })
    }

    /// Whether every item is adequately covered.
    #[must_use]
    pub const fn result(&self) -> bool {
        self.result
    }

    /// All items, in input order.
    #[must_use]
    pub fn items(&self) -> &[LinkedItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the trace contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item with the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another trace.
    #[must_use]
    pub fn item(&self, handle: ItemId) -> &LinkedItem {
        &self.items[handle.0]
    }

    /// The first item with the given identifier.
    #[must_use]
    pub fn find(&self, id: &Identifier) -> Option<&LinkedItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// All links, in construction order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The link with the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another trace.
    #[must_use]
    pub fn link(&self, handle: LinkId) -> &Link {
        &self.links[handle.0]
    }

    /// Items that are not adequately covered, in input order.
    pub fn defects(&self) -> impl Iterator<Item = &LinkedItem> + '_ {
        self.items.iter().filter(|item| item.is_defect())
    }

    /// Number of defect items.
    #[must_use]
    pub fn defect_count(&self) -> usize {
        self.defects().count()
    }

    /// Identifiers declared by more than one item.
    #[must_use]
    pub fn duplicates(&self) -> &[Identifier] {
        &self.duplicates
    }

    /// Groups of items that reach each other through resolved links.
    ///
    /// Each group is sorted, and the groups are sorted.
    #[must_use]
    pub fn cycles(&self) -> &[Vec<Identifier>] {
        &self.cycles
    }

    /// The links of `item`, in construction order.
    pub fn links_of<'a>(
        &'a self,
        item: &'a LinkedItem,
    ) -> impl Iterator<Item = TracedLink<'a>> + 'a {
        item.links.iter().map(move |&(handle, direction)| {
            let link = &self.links[handle.0];
            let other_id = match (direction, link.target) {
                (Direction::Outgoing, Some(target)) => self.items[target.0].id(),
                (Direction::Outgoing, None) => &link.reference.target,
                (Direction::Incoming, _) => self.items[link.source.0].id(),
            };
            TracedLink {
                handle,
                link,
                direction,
                other_id,
            }
        })
    }

    /// The links of `item` in one direction, sorted by the string form of the
    /// other end's identifier.
    ///
    /// The sort is stable, so links to the same identifier keep their
    /// construction order.
    #[must_use]
    pub fn sorted_links<'a>(
        &'a self,
        item: &'a LinkedItem,
        direction: Direction,
    ) -> Vec<TracedLink<'a>> {
        let mut links: Vec<_> = self
            .links_of(item)
            .filter(|link| link.direction == direction)
            .collect();
        links.sort_by_cached_key(|link| link.other_id.to_string());
        links
    }
}

fn link_item(
    id: ItemId,
    item: SpecificationItem,
    needed: BTreeSet<String>,
    links_of_item: Vec<(LinkId, Direction)>,
    coverage: Coverage,
    links: &[Link],
) -> LinkedItem {
    let outgoing = links_of_item
        .iter()
        .filter(|(_, direction)| *direction == Direction::Outgoing)
        .count();
    let incoming = links_of_item.len() - outgoing;
    let defective_links = links_of_item.iter().any(|&(handle, direction)| {
        direction == Direction::Outgoing && links[handle.0].status.is_defect()
    });

    LinkedItem {
        id,
        item,
        needed,
        links: links_of_item,
        coverage,
        incoming,
        outgoing,
        defective_links,
    }
}

/// Strongly connected components of the resolved link graph, including
/// self-links.
fn find_cycles(items: &[SpecificationItem], links: &[Link]) -> Vec<Vec<Identifier>> {
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::with_capacity(items.len(), links.len());
    for link in links {
        if let Some(target) = link.target {
            graph.add_edge(link.source.0, target.0, ());
        }
    }

    let mut cycles = Vec::new();
    for component in tarjan_scc(&graph) {
        let is_cycle = match component.as_slice() {
            [node] => graph.contains_edge(*node, *node),
            _ => true,
        };
        if is_cycle {
            let mut ids: Vec<_> = component
                .iter()
                .map(|&index| items[index].id().clone())
                .collect();
            ids.sort();
            cycles.push(ids);
        }
    }

    cycles.sort();
    cycles
}
