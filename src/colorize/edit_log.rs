//! Versioned log of document edits not yet consumed by both passes.

use std::collections::VecDeque;

use crate::error::{ColorizeError, ColorizeResult};
use crate::text::{Edit, TextChange};

/// Ordered edits with strictly increasing versions.
#[derive(Debug, Clone, Default)]
pub struct EditLog {
    edits: VecDeque<Edit>,
    /// Highest version ever recorded, kept across purges.
    latest_version: Option<i32>,
}

impl EditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the changes of document version `version`.
    ///
    /// Fails without modifying the log if the version does not increase or a
    /// change has an inverted range.
    pub fn record(&mut self, changes: Vec<TextChange>, version: i32) -> ColorizeResult<()> {
        if let Some(latest) = self.latest_version
            && version <= latest
        {
            return Err(ColorizeError::non_monotonic(version, latest));
        }
        for change in &changes {
            change.validate()?;
        }

        self.latest_version = Some(version);
        self.edits.push_back(Edit { version, changes });
        Ok(())
    }

    /// Edits with a version greater than `version`, oldest first.
    pub fn edits_after(&self, version: i32) -> impl Iterator<Item = &Edit> {
        self.edits.iter().filter(move |edit| edit.version > version)
    }

    /// Drop every edit with a version at or below `version`.
    ///
    /// Returns the number of edits removed.
    pub fn purge_through(&mut self, version: i32) -> usize {
        let before = self.edits.len();
        while self
            .edits
            .front()
            .is_some_and(|edit| edit.version <= version)
        {
            self.edits.pop_front();
        }
        before - self.edits.len()
    }

    pub fn latest_version(&self) -> Option<i32> {
        self.latest_version
    }

    pub fn versions(&self) -> Vec<i32> {
        self.edits.iter().map(|edit| edit.version).collect()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp_server::ls_types::{Position, Range};

    fn insert_x() -> Vec<TextChange> {
        vec![TextChange::insert(Position::new(0, 0), "x")]
    }

    #[test]
    fn test_record_keeps_versions_in_order() {
        let mut log = EditLog::new();
        log.record(insert_x(), 1).unwrap();
        log.record(insert_x(), 2).unwrap();
        log.record(insert_x(), 5).unwrap();

        assert_eq!(log.versions(), vec![1, 2, 5]);
        assert_eq!(log.latest_version(), Some(5));
    }

    #[test]
    fn test_record_rejects_non_increasing_version() {
        let mut log = EditLog::new();
        log.record(insert_x(), 3).unwrap();

        let err = log.record(insert_x(), 3).unwrap_err();
        assert!(matches!(
            err,
            ColorizeError::NonMonotonicVersion {
                version: 3,
                latest: 3
            }
        ));
        assert!(log.record(insert_x(), 2).is_err());
        assert_eq!(log.versions(), vec![3]);
    }

    #[test]
    fn test_record_rejects_inverted_change_without_side_effects() {
        let mut log = EditLog::new();
        let inverted = TextChange::delete(Range::new(Position::new(2, 0), Position::new(1, 0)));

        assert!(log.record(vec![inverted], 1).is_err());
        assert!(log.is_empty());
        assert_eq!(log.latest_version(), None);
    }

    #[test]
    fn test_edits_after_filters_by_version() {
        let mut log = EditLog::new();
        for version in 1..=4 {
            log.record(insert_x(), version).unwrap();
        }

        let versions: Vec<i32> = log.edits_after(2).map(|e| e.version).collect();
        assert_eq!(versions, vec![3, 4]);
        assert_eq!(log.edits_after(4).count(), 0);
    }

    #[test]
    fn test_purge_through_keeps_latest_version() {
        let mut log = EditLog::new();
        for version in 1..=4 {
            log.record(insert_x(), version).unwrap();
        }

        assert_eq!(log.purge_through(2), 2);
        assert_eq!(log.versions(), vec![3, 4]);

        assert_eq!(log.purge_through(10), 2);
        assert!(log.is_empty());
        // Monotonicity survives an empty log
        assert!(log.record(insert_x(), 4).is_err());
        assert!(log.record(insert_x(), 5).is_ok());
    }
}
