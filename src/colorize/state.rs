//! Version reconciliation between the edit log and both passes.
//!
//! Each pass replays the edit log from its own applied version, so a pass
//! whose latest classification result predates recent edits still has its
//! ranges moved to the current document coordinates.

use std::collections::BTreeMap;
use tower_lsp_server::ls_types::Range;

use super::edit_log::EditLog;
use super::store::{PassRanges, TokenRangeStore};
use crate::domain::{Category, Pass};
use crate::error::{ColorizeError, ColorizeResult};
use crate::text::TextChange;

const LOG_TARGET: &str = "irodori::reconcile";

/// Edit log and range store for one document.
#[derive(Debug, Clone)]
pub struct ColorizationState {
    edit_log: EditLog,
    store: TokenRangeStore,
}

impl ColorizationState {
    /// State for a document opened at `version`, with no ranges yet.
    pub fn new(version: i32) -> Self {
        Self {
            edit_log: EditLog::new(),
            store: TokenRangeStore::new(version),
        }
    }

    pub fn store(&self) -> &TokenRangeStore {
        &self.store
    }

    pub fn edit_log(&self) -> &EditLog {
        &self.edit_log
    }

    /// Append a document edit to the log.
    ///
    /// An edit at or below the purge bound is dropped straight away: both
    /// passes already hold results computed at or after it.
    pub fn record_edit(&mut self, changes: Vec<TextChange>, version: i32) -> ColorizeResult<()> {
        self.edit_log.record(changes, version)?;
        self.purge();
        Ok(())
    }

    /// Replay every logged edit newer than the pass's applied version.
    ///
    /// Returns the number of edits applied; zero once the pass is caught up.
    pub fn reconcile(&mut self, pass: Pass) -> usize {
        let state = self.store.pass_mut(pass);
        let mut applied = 0;
        for edit in self.edit_log.edits_after(state.applied_version) {
            state.ranges.apply_edit(edit);
            state.applied_version = edit.version;
            applied += 1;
            log::trace!(
                target: LOG_TARGET,
                "Applied edit {} to {} ranges",
                edit.version,
                pass
            );
        }
        applied
    }

    /// Reconcile both passes.
    pub fn reconcile_all(&mut self) -> usize {
        self.reconcile(Pass::Syntactic) + self.reconcile(Pass::Semantic)
    }

    /// Note that a classification result for `version` arrived.
    pub fn record_classification_received(&mut self, pass: Pass, version: i32) {
        let state = self.store.pass_mut(pass);
        state.last_received_version = state.last_received_version.max(version);
    }

    /// Drop edits that neither pass can need again.
    ///
    /// Both passes have received results at or beyond the purge bound, and
    /// results are never accepted below their pass's last received version.
    pub fn purge(&mut self) -> usize {
        let bound = self
            .store
            .syntactic
            .last_received_version
            .min(self.store.semantic.last_received_version);
        let removed = self.edit_log.purge_through(bound);
        if removed > 0 {
            log::debug!(
                target: LOG_TARGET,
                "Purged {} edits through version {}, {} remaining",
                removed,
                bound,
                self.edit_log.len()
            );
        }
        removed
    }

    /// Replace the syntactic ranges with a result computed at `version`.
    ///
    /// Returns `Ok(false)` when the result is older than one already
    /// received for this pass.
    pub fn replace_syntactic(
        &mut self,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        version: i32,
    ) -> ColorizeResult<bool> {
        self.replace(
            Pass::Syntactic,
            PassRanges::new(ranges_by_category, Vec::new()),
            version,
        )
    }

    /// Replace the semantic ranges and inactive regions with a result
    /// computed at `version`.
    pub fn replace_semantic(
        &mut self,
        ranges_by_category: BTreeMap<Category, Vec<Range>>,
        inactive: Vec<Range>,
        version: i32,
    ) -> ColorizeResult<bool> {
        self.replace(
            Pass::Semantic,
            PassRanges::new(ranges_by_category, inactive),
            version,
        )
    }

    fn replace(&mut self, pass: Pass, ranges: PassRanges, version: i32) -> ColorizeResult<bool> {
        validate_ranges(&ranges)?;

        let state = self.store.pass_mut(pass);
        if version < state.last_received_version {
            log::debug!(
                target: LOG_TARGET,
                "Ignoring stale {} result for version {} (already received {})",
                pass,
                version,
                state.last_received_version
            );
            return Ok(false);
        }

        // The classifier computed these against `version` exactly
        state.ranges = ranges;
        state.applied_version = version;
        self.record_classification_received(pass, version);
        Ok(true)
    }
}

fn validate_ranges(ranges: &PassRanges) -> ColorizeResult<()> {
    let categorized = ranges.categories().flat_map(|c| ranges.ranges(c).iter());
    for range in categorized.chain(ranges.inactive()) {
        if range.start > range.end {
            return Err(ColorizeError::invalid_range(range.start, range.end));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp_server::ls_types::Position;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    fn keywords(ranges: Vec<Range>) -> BTreeMap<Category, Vec<Range>> {
        BTreeMap::from([(Category::Keyword, ranges)])
    }

    /// Insert one line at the top of the document.
    fn push_line() -> Vec<TextChange> {
        vec![TextChange::insert(Position::new(0, 0), "\n")]
    }

    #[test]
    fn test_reconcile_moves_ranges_to_current_version() {
        let mut state = ColorizationState::new(0);
        state
            .replace_syntactic(keywords(vec![range(2, 0, 2, 4)]), 0)
            .unwrap();
        state.record_edit(push_line(), 1).unwrap();
        state.record_edit(push_line(), 2).unwrap();

        assert_eq!(state.reconcile(Pass::Syntactic), 2);

        let syntactic = state.store().pass(Pass::Syntactic);
        assert_eq!(syntactic.applied_version(), 2);
        assert_eq!(
            syntactic.ranges().ranges(Category::Keyword),
            &[range(4, 0, 4, 4)]
        );
    }

    #[test]
    fn test_reconcile_twice_is_noop() {
        let mut state = ColorizationState::new(0);
        state
            .replace_semantic(keywords(vec![range(1, 1, 1, 5)]), vec![], 0)
            .unwrap();
        state.record_edit(push_line(), 1).unwrap();

        assert_eq!(state.reconcile(Pass::Semantic), 1);
        let after_first = state.store().clone();
        assert_eq!(state.reconcile(Pass::Semantic), 0);
        assert_eq!(state.store(), &after_first);
    }

    #[test]
    fn test_stale_result_is_absorbed() {
        let mut state = ColorizationState::new(0);
        assert!(
            state
                .replace_syntactic(keywords(vec![range(0, 0, 0, 1)]), 5)
                .unwrap()
        );
        assert!(
            !state
                .replace_syntactic(keywords(vec![range(9, 0, 9, 1)]), 4)
                .unwrap()
        );

        let syntactic = state.store().pass(Pass::Syntactic);
        assert_eq!(syntactic.last_received_version(), 5);
        assert_eq!(
            syntactic.ranges().ranges(Category::Keyword),
            &[range(0, 0, 0, 1)]
        );
    }

    #[test]
    fn test_replace_rejects_inverted_ranges() {
        let mut state = ColorizationState::new(0);
        let err = state
            .replace_semantic(BTreeMap::new(), vec![range(3, 0, 2, 0)], 1)
            .unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(state.store().pass(Pass::Semantic).last_received_version(), 0);
    }

    #[test]
    fn test_record_classification_received_never_decreases() {
        let mut state = ColorizationState::new(0);
        state.record_classification_received(Pass::Semantic, 7);
        state.record_classification_received(Pass::Semantic, 3);
        assert_eq!(state.store().pass(Pass::Semantic).last_received_version(), 7);
    }

    #[test]
    fn test_purge_bound_is_minimum_of_both_passes() {
        let mut state = ColorizationState::new(0);
        for version in 1..=4 {
            state.record_edit(push_line(), version).unwrap();
        }

        state.replace_semantic(BTreeMap::new(), vec![], 3).unwrap();
        // Syntactic has received nothing beyond the open version
        assert_eq!(state.purge(), 0);

        state.replace_syntactic(BTreeMap::new(), 2).unwrap();
        assert_eq!(state.purge(), 2);
        assert_eq!(state.edit_log().versions(), vec![3, 4]);
    }

    #[test]
    fn test_edit_at_received_version_is_not_kept() {
        let mut state = ColorizationState::new(0);
        state
            .replace_syntactic(keywords(vec![range(1, 0, 1, 4)]), 5)
            .unwrap();
        state.replace_semantic(BTreeMap::new(), vec![], 5).unwrap();
        state.purge();

        // Both passes already reflect version 5
        state.record_edit(push_line(), 5).unwrap();
        state.record_edit(push_line(), 6).unwrap();
        state.reconcile_all();

        assert_eq!(state.edit_log().versions(), vec![6]);
        assert_eq!(
            state
                .store()
                .pass(Pass::Syntactic)
                .ranges()
                .ranges(Category::Keyword),
            &[range(2, 0, 2, 4)]
        );
    }
}
