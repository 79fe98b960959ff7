//! Parallel indexer.
//!
//! The calling thread is the producer: it reads lines sequentially from the
//! `FileParser` (which is exclusively-owned and thus inherently single
//! reader) and pushes them onto a bounded `crossbeam-channel` queue. A fixed
//! pool of workers, spawned via `std::thread::scope`, drain the queue and
//! run the line parser; each worker keeps a private per-column value map and
//! a private `failures` set so no column map is shared/contended during the
//! hot loop.

use std::collections::HashMap;

use crossbeam_channel::bounded;
use unicode_segmentation::UnicodeSegmentation;

use crate::bitset::{BitSet, EwahBitSet};
use crate::error::CoreResult;
use crate::files::{FileParser, SeekableRead};
use crate::line_parser::{ColumnFormat, ILineParser};

use super::column::ColumnIndex;

enum Item {
    Line(u64, String),
    Done,
}

struct WorkerOutput {
    /// One `value -> line numbers` map per column (empty map for
    /// non-indexed columns, never consulted).
    columns: Vec<HashMap<String, Vec<u64>>>,
    failures: Vec<u64>,
    max_width: Vec<(usize, u64)>,
}

/// Build the per-column indexes for every `indexed` column. Returns `Ok(None)`
/// if `stop_requested` fired before the queue drained (callers discard the
/// partial index).
pub fn build<R: SeekableRead>(
    file: &mut FileParser<R>,
    parser: &dyn ILineParser,
    max_threads: usize,
    stop_requested: &dyn Fn() -> bool,
    mut progress: impl FnMut(usize, usize),
) -> CoreResult<Option<Vec<ColumnIndex>>> {
    let formats = parser.column_formats().to_vec();
    let total = file.line_count();

    if !formats.iter().any(|f| f.indexed) {
        return Ok(Some(formats.iter().map(|f| ColumnIndex::new(f.indexed)).collect()));
    }

    let threads = max_threads.max(1);
    let (tx, rx) = bounded::<Item>(256 * threads);

    let outputs = std::thread::scope(|scope| -> CoreResult<Vec<WorkerOutput>> {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let rx = rx.clone();
                let formats = &formats;
                scope.spawn(move || run_worker(rx, parser, formats))
            })
            .collect();

        let mut stopped = false;
        for n in 0..total {
            if stop_requested() {
                stopped = true;
                break;
            }
            let line = file.read_line_string(n)?;
            if tx.send(Item::Line(n as u64, line)).is_err() {
                break;
            }
            progress(n + 1, total);
        }
        for _ in 0..threads {
            let _ = tx.send(Item::Done);
        }
        drop(tx);

        let mut outputs = Vec::with_capacity(threads);
        for h in handles {
            outputs.push(h.join().expect("indexing worker panicked"));
        }
        if stopped {
            return Ok(Vec::new());
        }
        Ok(outputs)
    })?;

    if outputs.is_empty() {
        return Ok(None);
    }

    Ok(Some(reduce(&formats, outputs)))
}

fn run_worker(
    rx: crossbeam_channel::Receiver<Item>,
    parser: &dyn ILineParser,
    formats: &[ColumnFormat],
) -> WorkerOutput {
    let mut columns: Vec<HashMap<String, Vec<u64>>> = formats.iter().map(|_| HashMap::new()).collect();
    let mut failures = Vec::new();
    let mut max_width = vec![(0usize, 0u64); formats.len()];
    let mut ctx = parser.create_context();
    let mut cols = Vec::new();

    while let Ok(item) = rx.recv() {
        let (n, line) = match item {
            Item::Done => break,
            Item::Line(n, line) => (n, line),
        };
        if parser.parse_line(&line, &mut cols, &mut *ctx) {
            for (i, format) in formats.iter().enumerate() {
                let value = cols.get(i).cloned().unwrap_or_default();
                let width = value.graphemes(true).count();
                if width > max_width[i].0 {
                    max_width[i] = (width, n);
                }
                if format.indexed {
                    columns[i].entry(value).or_default().push(n);
                }
            }
        } else {
            failures.push(n);
        }
    }

    WorkerOutput { columns, failures, max_width }
}

/// Union every worker's failures into one `multilines` set, then reduce
/// per-column value maps across workers, consolidating continuations and
/// computing the final max-width probes.
fn reduce(formats: &[ColumnFormat], outputs: Vec<WorkerOutput>) -> Vec<ColumnIndex> {
    let mut multilines = EwahBitSet::new();
    for out in &outputs {
        for &n in &out.failures {
            multilines.insert(n);
        }
    }
    multilines.freeze();

    let mut merged: Vec<HashMap<String, Vec<u64>>> = formats.iter().map(|_| HashMap::new()).collect();
    let mut max_width = vec![(0usize, 0u64); formats.len()];
    for out in outputs {
        for (i, col) in out.columns.into_iter().enumerate() {
            for (value, lines) in col {
                merged[i].entry(value).or_default().extend(lines);
            }
        }
        for (i, w) in out.max_width.into_iter().enumerate() {
            if w.0 > max_width[i].0 {
                max_width[i] = w;
            }
        }
    }

    formats
        .iter()
        .enumerate()
        .map(|(i, format)| {
            let mut column = ColumnIndex::new(format.indexed);
            column.note_width(max_width[i].0, max_width[i].1);
            if format.indexed {
                for (value, lines) in std::mem::take(&mut merged[i]) {
                    let mut raw = EwahBitSet::new();
                    for n in lines {
                        raw.insert(n);
                    }
                    raw.freeze();
                    let combined = combine(&raw, &multilines);
                    column.set(value, combined);
                }
            }
            column
        })
        .collect()
}

/// Extend `index` so that every set bit `i` also pulls in the run of
/// immediately-following `multilines` bits (the continuation lines that
/// failed to parse), stopping at the first gap.
fn combine(index: &EwahBitSet, multilines: &EwahBitSet) -> EwahBitSet {
    let mut result = EwahBitSet::new();
    for i in index.iter() {
        result.insert(i);
        let mut j = i + 1;
        while multilines.contains(j) {
            result.insert(j);
            j += 1;
        }
    }
    result.freeze();
    result
}
