use std::collections::BTreeSet;

/// The coverage classification of one item.
///
/// The three sets are pairwise disjoint. `covered ∪ uncovered` is exactly the
/// set of needed artifact types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    covered: BTreeSet<String>,
    uncovered: BTreeSet<String>,
    over_covered: BTreeSet<String>,
}

impl Coverage {
    /// Classify the `needed` types against the artifact types `provided` by
    /// covering items.
    ///
    /// The result does not depend on the order (or multiplicity) of
    /// `provided`.
    #[must_use]
    pub fn classify<'a>(
        needed: &BTreeSet<String>,
        provided: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let provided: BTreeSet<&str> = provided.into_iter().collect();

        let (covered, uncovered) = needed
            .iter()
            .cloned()
            .partition(|needed_type| provided.contains(needed_type.as_str()));

        let over_covered = provided
            .into_iter()
            .filter(|provided_type| !needed.contains(*provided_type))
            .map(str::to_string)
            .collect();

        Self {
            covered,
            uncovered,
            over_covered,
        }
    }

    /// Needed types provided by at least one covering item.
    #[must_use]
    pub const fn covered(&self) -> &BTreeSet<String> {
        &self.covered
    }

    /// Needed types no covering item provides.
    #[must_use]
    pub const fn uncovered(&self) -> &BTreeSet<String> {
        &self.uncovered
    }

    /// Types provided by covering items but not needed.
    #[must_use]
    pub const fn over_covered(&self) -> &BTreeSet<String> {
        &self.over_covered
    }

    /// Whether every needed type is covered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }
}
