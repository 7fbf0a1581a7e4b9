//! Benchmark for replaying edits over stored ranges.
//!
//! Measures how reconciliation scales with the number of tracked ranges and
//! the number of edits pending in the log.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use irodori::colorize::ColorizationState;
use irodori::domain::{Category, Pass};
use irodori::text::{TextChange, apply_changes};
use std::collections::BTreeMap;
use std::hint::black_box;
use tower_lsp_server::ls_types::{Position, Range};

/// One short range per line, spread round-robin over every category.
fn generate_ranges(count: u32) -> BTreeMap<Category, Vec<Range>> {
    let mut ranges: BTreeMap<Category, Vec<Range>> = BTreeMap::new();
    for line in 0..count {
        let category = Category::ALL[line as usize % Category::COUNT];
        ranges
            .entry(category)
            .or_default()
            .push(Range::new(Position::new(line, 4), Position::new(line, 12)));
    }
    ranges
}

/// Typing a character at the start of a line near the middle of the document.
fn keystroke(line: u32) -> Vec<TextChange> {
    vec![TextChange::insert(Position::new(line, 0), "x")]
}

fn benchmark_apply_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_changes");

    for count in [100u32, 1_000, 10_000].iter() {
        let ranges: Vec<Range> = generate_ranges(*count).into_values().flatten().collect();
        let changes = vec![
            TextChange::insert(Position::new(count / 2, 0), "line\n"),
            TextChange::delete(Range::new(Position::new(1, 0), Position::new(3, 0))),
        ];

        group.bench_with_input(BenchmarkId::from_parameter(count), &ranges, |b, ranges| {
            b.iter(|| {
                let mut ranges = ranges.clone();
                apply_changes(&mut ranges, black_box(&changes));
                ranges
            })
        });
    }

    group.finish();
}

fn benchmark_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_pending_edits");
    let lines = 5_000;

    for pending in [1i32, 10, 50].iter() {
        let mut state = ColorizationState::new(0);
        state
            .replace_semantic(generate_ranges(lines), Vec::new(), 0)
            .expect("generated ranges are well-formed");
        for version in 1..=*pending {
            state
                .record_edit(keystroke(lines / 2), version)
                .expect("versions increase");
        }

        group.bench_with_input(BenchmarkId::from_parameter(pending), &state, |b, state| {
            b.iter(|| {
                let mut state = state.clone();
                state.reconcile(Pass::Semantic)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_apply_changes, benchmark_reconcile);
criterion_main!(benches);
