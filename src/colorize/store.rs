//! Per-pass storage of classified ranges.

use std::collections::BTreeMap;
use tower_lsp_server::ls_types::Range;

use crate::domain::{Category, Pass};
use crate::text::{Edit, apply_changes};

/// Ranges produced by one pass, grouped by category.
///
/// Only the semantic pass fills `inactive`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassRanges {
    by_category: BTreeMap<Category, Vec<Range>>,
    inactive: Vec<Range>,
}

impl PassRanges {
    pub fn new(by_category: BTreeMap<Category, Vec<Range>>, inactive: Vec<Range>) -> Self {
        Self {
            by_category,
            inactive,
        }
    }

    pub fn ranges(&self, category: Category) -> &[Range] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn inactive(&self) -> &[Range] {
        &self.inactive
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.by_category.keys().copied()
    }

    /// Map every range through the changes of `edit`, dropping consumed ranges.
    pub fn apply_edit(&mut self, edit: &Edit) {
        for ranges in self.by_category.values_mut() {
            apply_changes(ranges, &edit.changes);
        }
        apply_changes(&mut self.inactive, &edit.changes);
    }

    pub fn range_count(&self) -> usize {
        self.by_category.values().map(Vec::len).sum::<usize>() + self.inactive.len()
    }
}

/// Ranges of one pass plus the version bookkeeping that goes with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassState {
    pub(crate) ranges: PassRanges,
    /// Document version the stored ranges are expressed in.
    pub(crate) applied_version: i32,
    /// Highest version a classification result was received for.
    pub(crate) last_received_version: i32,
}

impl PassState {
    pub fn new(version: i32) -> Self {
        Self {
            ranges: PassRanges::default(),
            applied_version: version,
            last_received_version: version,
        }
    }

    pub fn ranges(&self) -> &PassRanges {
        &self.ranges
    }

    pub fn applied_version(&self) -> i32 {
        self.applied_version
    }

    pub fn last_received_version(&self) -> i32 {
        self.last_received_version
    }
}

/// Syntactic and semantic ranges for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRangeStore {
    pub(crate) syntactic: PassState,
    pub(crate) semantic: PassState,
}

impl TokenRangeStore {
    /// Empty store for a document opened at `version`.
    pub fn new(version: i32) -> Self {
        Self {
            syntactic: PassState::new(version),
            semantic: PassState::new(version),
        }
    }

    pub fn pass(&self, pass: Pass) -> &PassState {
        match pass {
            Pass::Syntactic => &self.syntactic,
            Pass::Semantic => &self.semantic,
        }
    }

    pub(crate) fn pass_mut(&mut self, pass: Pass) -> &mut PassState {
        match pass {
            Pass::Syntactic => &mut self.syntactic,
            Pass::Semantic => &mut self.semantic,
        }
    }

    /// Ranges painted for `category`: syntactic first, then semantic.
    pub fn merged(&self, category: Category) -> Vec<Range> {
        let syntactic = self.syntactic.ranges.ranges(category);
        let semantic = self.semantic.ranges.ranges(category);
        let mut merged = Vec::with_capacity(syntactic.len() + semantic.len());
        merged.extend_from_slice(syntactic);
        merged.extend_from_slice(semantic);
        merged
    }

    /// Every category with at least one range in either pass, in priority order.
    pub fn merged_all(&self) -> BTreeMap<Category, Vec<Range>> {
        let mut all = BTreeMap::new();
        for category in Category::ALL {
            let ranges = self.merged(category);
            if !ranges.is_empty() {
                all.insert(category, ranges);
            }
        }
        all
    }

    pub fn inactive(&self) -> &[Range] {
        self.semantic.ranges.inactive()
    }
}
