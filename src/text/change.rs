//! Text changes and versioned edits.
//!
//! A [`TextChange`] is a single replacement of a removed range by inserted
//! text. An [`Edit`] groups the changes of one document version; each change
//! is expressed in the coordinate space produced by the change before it.

use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::{Position, Range, TextDocumentContentChangeEvent};

use crate::error::{ColorizeError, ColorizeResult};

/// One text replacement: `removed` is replaced by `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    #[serde(rename = "range")]
    pub removed: Range,
    pub text: String,
}

impl TextChange {
    pub fn new(removed: Range, text: impl Into<String>) -> Self {
        Self {
            removed,
            text: text.into(),
        }
    }

    /// Insertion of `text` at `at`.
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(Range::new(at, at), text)
    }

    /// Deletion of `removed`.
    pub fn delete(removed: Range) -> Self {
        Self::new(removed, String::new())
    }

    /// Replacement of the whole document.
    ///
    /// Removes from the origin to the largest representable position, so every
    /// tracked range is consumed.
    pub fn replace_all(text: impl Into<String>) -> Self {
        Self::new(
            Range::new(Position::new(0, 0), Position::new(u32::MAX, u32::MAX)),
            text,
        )
    }

    /// Build a change from an LSP `didChange` content event.
    ///
    /// Events without a range are full-document syncs.
    pub fn from_lsp(event: TextDocumentContentChangeEvent) -> Self {
        match event.range {
            Some(range) => Self::new(range, event.text),
            None => Self::replace_all(event.text),
        }
    }

    /// Position where the inserted text ends when typed at `removed.start`.
    pub fn inserted_end(&self) -> Position {
        inserted_end(self.removed.start, &self.text)
    }

    /// Reject changes whose removed range is inverted.
    pub fn validate(&self) -> ColorizeResult<()> {
        if self.removed.start > self.removed.end {
            return Err(ColorizeError::invalid_range(
                self.removed.start,
                self.removed.end,
            ));
        }
        Ok(())
    }
}

/// A versioned group of changes, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub version: i32,
    pub changes: Vec<TextChange>,
}

/// Compute where `text` ends when inserted at `start`.
///
/// Character offsets are UTF-16 code units, matching LSP positions.
pub fn inserted_end(start: Position, text: &str) -> Position {
    let lines: Vec<&str> = text.split('\n').collect();
    let line_count = lines.len();
    let last_line_len = lines.last().map(|l| utf16_len(l)).unwrap_or(0);

    if line_count > 1 {
        Position::new(start.line.saturating_add(line_count as u32 - 1), last_line_len)
    } else {
        Position::new(start.line, start.character.saturating_add(last_line_len))
    }
}

fn utf16_len(text: &str) -> u32 {
    text.chars().map(|ch| ch.len_utf16() as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserted_end_single_line() {
        assert_eq!(
            inserted_end(Position::new(2, 4), "abc"),
            Position::new(2, 7)
        );
    }

    #[test]
    fn test_inserted_end_empty_text_is_start() {
        assert_eq!(inserted_end(Position::new(3, 9), ""), Position::new(3, 9));
    }

    #[test]
    fn test_inserted_end_multi_line_uses_trailing_line_length() {
        assert_eq!(
            inserted_end(Position::new(1, 10), "foo\nbar\nxy"),
            Position::new(3, 2)
        );
        assert_eq!(
            inserted_end(Position::new(1, 10), "foo\n"),
            Position::new(2, 0)
        );
    }

    #[test]
    fn test_inserted_end_counts_utf16_units() {
        // 'あ' is one UTF-16 unit, '😀' is two
        assert_eq!(
            inserted_end(Position::new(0, 0), "あ😀"),
            Position::new(0, 3)
        );
    }

    #[test]
    fn test_from_lsp_full_sync_replaces_everything() {
        let event = TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new content".to_string(),
        };

        let change = TextChange::from_lsp(event);

        assert_eq!(change.removed.start, Position::new(0, 0));
        assert_eq!(change.removed.end, Position::new(u32::MAX, u32::MAX));
        assert_eq!(change.text, "new content");
    }

    #[test]
    fn test_from_lsp_incremental_keeps_range() {
        let range = Range::new(Position::new(0, 6), Position::new(0, 11));
        let event = TextDocumentContentChangeEvent {
            range: Some(range),
            range_length: Some(5),
            text: "rust".to_string(),
        };

        let change = TextChange::from_lsp(event);

        assert_eq!(change.removed, range);
        assert_eq!(change.inserted_end(), Position::new(0, 10));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let change = TextChange::delete(Range::new(Position::new(4, 0), Position::new(3, 0)));
        let err = change.validate().unwrap_err();
        assert!(err.is_contract_violation());

        assert!(TextChange::insert(Position::new(1, 1), "x").validate().is_ok());
    }
}
