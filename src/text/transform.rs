//! Mapping ranges through text replacements.
//!
//! A replacement removes `[removed_start, removed_end)` and inserts text that
//! ends at `inserted_end` when typed from `removed_start`. Ranges are mapped
//! geometrically from these three positions; the document text is never read.

use tower_lsp_server::ls_types::{Position, Range};

use super::change::TextChange;

/// Map `range` through one replacement.
///
/// Returns `None` when the replacement consumes the whole range.
///
/// Cases, in evaluation order:
/// 1. The replacement starts at or after the range end: unchanged.
/// 2. The replacement starts at or before the range start: the range is
///    deleted if fully removed, otherwise its surviving tail is shifted.
/// 3. The replacement starts inside the range: the range start stays and its
///    end follows the inserted text.
pub fn transform_range(
    range: Range,
    removed_start: Position,
    removed_end: Position,
    inserted_end: Position,
) -> Option<Range> {
    // Case 1: edit entirely after the range
    if removed_start >= range.end {
        return Some(range);
    }

    // Case 2: edit starts at or before the range
    if removed_start <= range.start {
        if removed_end >= range.end {
            return None;
        }

        let surviving = if removed_end >= range.start {
            Range::new(removed_end, range.end)
        } else {
            range
        };

        let after_removal = Range::new(
            shift_for_removal(surviving.start, removed_start, removed_end),
            shift_for_removal(surviving.end, removed_start, removed_end),
        );
        return Some(Range::new(
            shift_for_insertion(after_removal.start, removed_start, inserted_end),
            shift_for_insertion(after_removal.end, removed_start, inserted_end),
        ));
    }

    // Case 3: edit starts strictly inside the range
    if removed_end >= range.end {
        return Some(Range::new(range.start, inserted_end));
    }

    let end = if removed_end.line == range.end.line {
        Position::new(
            inserted_end.line,
            inserted_end.character + (range.end.character - removed_end.character),
        )
    } else {
        Position::new(
            inserted_end.line + (range.end.line - removed_end.line),
            range.end.character,
        )
    };
    Some(Range::new(range.start, end))
}

/// Map `range` through a [`TextChange`].
pub fn apply_change(range: Range, change: &TextChange) -> Option<Range> {
    transform_range(
        range,
        change.removed.start,
        change.removed.end,
        change.inserted_end(),
    )
}

/// Map every range through `changes` in order, dropping consumed ranges.
pub fn apply_changes(ranges: &mut Vec<Range>, changes: &[TextChange]) {
    for change in changes {
        let inserted_end = change.inserted_end();
        ranges.retain_mut(|range| {
            match transform_range(*range, change.removed.start, change.removed.end, inserted_end)
            {
                Some(mapped) => {
                    *range = mapped;
                    true
                }
                None => false,
            }
        });
    }
}

/// Move a position at or after `removed_end` to where it lands once
/// `[removed_start, removed_end)` is deleted.
fn shift_for_removal(pos: Position, removed_start: Position, removed_end: Position) -> Position {
    if pos.line == removed_end.line {
        Position::new(
            removed_start.line,
            removed_start.character + (pos.character - removed_end.character),
        )
    } else {
        Position::new(
            pos.line - (removed_end.line - removed_start.line),
            pos.character,
        )
    }
}

/// Move a position at or after `at` past text inserted at `at` that ends at
/// `inserted_end`.
fn shift_for_insertion(pos: Position, at: Position, inserted_end: Position) -> Position {
    if pos.line == at.line {
        Position::new(
            inserted_end.line,
            inserted_end.character + (pos.character - at.character),
        )
    } else {
        Position::new(pos.line + (inserted_end.line - at.line), pos.character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pos(line: u32, character: u32) -> Position {
        Position::new(line, character)
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(pos(sl, sc), pos(el, ec))
    }

    #[rstest]
    #[case::before_range(pos(0, 0))]
    #[case::at_range_start(pos(2, 5))]
    #[case::inside_range(pos(2, 7))]
    #[case::at_range_end(pos(2, 10))]
    #[case::after_range(pos(9, 1))]
    fn test_zero_length_edit_is_identity(#[case] p: Position) {
        let r = range(2, 5, 2, 10);
        assert_eq!(transform_range(r, p, p, p), Some(r));
    }

    #[test]
    fn test_edit_after_range_is_noop() {
        let r = range(1, 2, 3, 4);
        // Replace a multi-line block that starts exactly at the range end
        assert_eq!(transform_range(r, pos(3, 4), pos(8, 0), pos(3, 9)), Some(r));
        assert_eq!(transform_range(r, pos(5, 0), pos(5, 3), pos(7, 1)), Some(r));
    }

    #[test]
    fn test_edit_consuming_range_deletes_it() {
        let r = range(2, 5, 2, 10);
        assert_eq!(transform_range(r, pos(2, 5), pos(2, 10), pos(2, 5)), None);
        assert_eq!(transform_range(r, pos(1, 0), pos(4, 0), pos(1, 3)), None);
    }

    #[test]
    fn test_empty_range_inside_removed_lines_is_deleted() {
        let r = range(5, 0, 5, 0);
        assert_eq!(transform_range(r, pos(4, 0), pos(6, 0), pos(4, 0)), None);
    }

    #[test]
    fn test_replacement_before_range_on_same_line() {
        // "abc" at 2:0..2:3 replaced by "ab"
        let r = range(2, 5, 2, 10);
        assert_eq!(
            transform_range(r, pos(2, 0), pos(2, 3), pos(2, 2)),
            Some(range(2, 4, 2, 9))
        );
    }

    #[test]
    fn test_insert_characters_before_range_shifts_columns() {
        let r = range(3, 4, 3, 8);
        let change = TextChange::insert(pos(3, 1), "xyz");
        assert_eq!(apply_change(r, &change), Some(range(3, 7, 3, 11)));
    }

    #[test]
    fn test_insert_characters_before_multiline_range_keeps_end_column() {
        let r = range(3, 4, 5, 2);
        let change = TextChange::insert(pos(3, 0), "xy");
        assert_eq!(apply_change(r, &change), Some(range(3, 6, 5, 2)));
    }

    #[test]
    fn test_insert_lines_before_range_shifts_lines() {
        let r = range(4, 2, 4, 6);
        let change = TextChange::insert(pos(1, 3), "\n\n\n");
        assert_eq!(apply_change(r, &change), Some(range(7, 2, 7, 6)));
    }

    #[test]
    fn test_newline_inserted_on_range_line_moves_range_down() {
        // Splitting line 2 before the range moves the range to the new line
        let r = range(2, 5, 2, 10);
        let change = TextChange::insert(pos(2, 3), "\n  ");
        assert_eq!(apply_change(r, &change), Some(range(3, 4, 3, 9)));
    }

    #[test]
    fn test_deleting_lines_before_range_pulls_it_up() {
        let r = range(6, 1, 7, 3);
        let change = TextChange::delete(range(2, 0, 4, 0));
        assert_eq!(apply_change(r, &change), Some(range(4, 1, 5, 3)));
    }

    #[test]
    fn test_joining_lines_before_range() {
        // Delete the newline at the end of line 1 (length 7); line 2 joins line 1
        let r = range(2, 4, 2, 9);
        let change = TextChange::delete(range(1, 7, 2, 0));
        assert_eq!(apply_change(r, &change), Some(range(1, 11, 1, 16)));
    }

    #[test]
    fn test_edit_overlapping_range_head_trims_start() {
        // Remove 2:0..2:7 overlapping the first two characters of the range
        let r = range(2, 5, 2, 10);
        let change = TextChange::new(range(2, 0, 2, 7), "q");
        assert_eq!(apply_change(r, &change), Some(range(2, 1, 2, 4)));
    }

    #[test]
    fn test_edit_overlapping_multiline_head_trims_start() {
        let r = range(2, 5, 4, 3);
        let change = TextChange::new(range(1, 0, 3, 2), "ab\nc");
        assert_eq!(apply_change(r, &change), Some(range(2, 1, 3, 3)));
    }

    #[test]
    fn test_edit_inside_range_on_end_line_moves_end() {
        let r = range(2, 5, 2, 20);
        let change = TextChange::new(range(2, 8, 2, 10), "hello");
        assert_eq!(apply_change(r, &change), Some(range(2, 5, 2, 23)));
    }

    #[test]
    fn test_multiline_insert_inside_range_moves_end_to_new_line() {
        let r = range(2, 5, 2, 20);
        let change = TextChange::insert(pos(2, 8), "a\nbc");
        assert_eq!(apply_change(r, &change), Some(range(2, 5, 3, 14)));
    }

    #[test]
    fn test_edit_inside_range_on_earlier_line_shifts_only_lines() {
        let r = range(1, 0, 6, 4);
        let change = TextChange::new(range(2, 3, 4, 1), "x\ny\nz\nw");
        // removed 2 line breaks, inserted 3
        assert_eq!(apply_change(r, &change), Some(range(1, 0, 7, 4)));
    }

    #[test]
    fn test_edit_consuming_range_tail_ends_at_insertion() {
        let r = range(2, 5, 3, 1);
        let change = TextChange::new(range(2, 7, 4, 0), "tail");
        assert_eq!(apply_change(r, &change), Some(range(2, 5, 2, 11)));
    }

    #[rstest]
    #[case::same_line_replace(range(2, 0, 2, 3), "ab")]
    #[case::insert_lines(range(0, 1, 0, 1), "a\nb\nc")]
    #[case::delete_lines(range(0, 2, 1, 4), "")]
    #[case::replace_across_lines(range(0, 0, 1, 3), "xx\ny")]
    fn test_edit_then_inverse_restores_range(#[case] removed: Range, #[case] text: &str) {
        // Removed text is chosen so each removed line is 8 characters wide
        let original = range(2, 5, 3, 4);
        let forward = TextChange::new(removed, text);
        let mapped = apply_change(original, &forward).unwrap();

        let removed_text = removed_text_for(removed, 8);
        let inverse = TextChange::new(Range::new(removed.start, forward.inserted_end()), removed_text);
        assert_eq!(apply_change(mapped, &inverse), Some(original));
    }

    fn removed_text_for(removed: Range, line_width: u32) -> String {
        if removed.start.line == removed.end.line {
            return "-".repeat((removed.end.character - removed.start.character) as usize);
        }
        let mut text = "-".repeat((line_width - removed.start.character) as usize);
        for _ in removed.start.line + 1..removed.end.line {
            text.push('\n');
            text.push_str(&"-".repeat(line_width as usize));
        }
        text.push('\n');
        text.push_str(&"-".repeat(removed.end.character as usize));
        text
    }

    #[test]
    fn test_apply_changes_runs_in_sequence_and_drops_consumed() {
        let mut ranges = vec![range(0, 0, 0, 3), range(1, 0, 1, 4), range(3, 2, 3, 5)];
        let changes = vec![
            // Delete line 1 entirely; line 3 becomes line 2
            TextChange::delete(range(1, 0, 2, 0)),
            // In the new coordinates, insert at the start of line 2
            TextChange::insert(pos(2, 0), "ab"),
        ];

        apply_changes(&mut ranges, &changes);

        assert_eq!(ranges, vec![range(0, 0, 0, 3), range(2, 4, 2, 7)]);
    }

    #[test]
    fn test_full_document_replacement_consumes_everything() {
        let mut ranges = vec![range(0, 0, 0, 3), range(10, 0, 12, 4)];
        apply_changes(&mut ranges, &[TextChange::replace_all("fresh")]);
        assert!(ranges.is_empty());
    }
}
