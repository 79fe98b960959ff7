//! The central data structure: per-column inverted index, current filter,
//! and the resulting `LineMap`.

pub mod column;
pub mod filter;
pub mod parallel;
pub mod search;

pub use column::ColumnIndex;
pub use filter::ColumnFilter;
pub use search::Searcher;

use crate::bitset::{AppendOnlyBitSet, BitSet, EwahBitSet};
use crate::error::CoreResult;
use crate::files::{FileParser, SeekableRead};
use crate::hist::Hist;
use crate::line_parser::{ColumnFormat, ILineParser};

/// Random-access view over the visible rows: either the identity mapping
/// (no filter/search in effect) or an explicit append-only bitset of file
/// line numbers.
#[derive(Clone)]
pub enum LineMap {
    Identity(usize),
    Filtered(AppendOnlyBitSet),
}

impl LineMap {
    pub fn size(&self) -> usize {
        match self {
            LineMap::Identity(n) => *n,
            LineMap::Filtered(b) => b.size(),
        }
    }

    pub fn get(&self, k: usize) -> u64 {
        match self {
            LineMap::Identity(n) => {
                assert!(k < *n, "LineMap::get index out of range");
                k as u64
            }
            LineMap::Filtered(b) => b.get(k),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        match self {
            LineMap::Identity(n) => Box::new(0..*n as u64),
            LineMap::Filtered(b) => b.iter(),
        }
    }
}

pub struct Index {
    formats: Vec<ColumnFormat>,
    columns: Vec<ColumnIndex>,
    filter: Option<EwahBitSet>,
    active_filters: Vec<ColumnFilter>,
    line_map: LineMap,
    unfiltered_count: usize,
}

impl Index {
    pub fn new(formats: Vec<ColumnFormat>) -> Self {
        let columns = formats.iter().map(|f| ColumnIndex::new(f.indexed)).collect();
        Self {
            formats,
            columns,
            filter: None,
            active_filters: Vec::new(),
            line_map: LineMap::Identity(0),
            unfiltered_count: 0,
        }
    }

    pub fn column_formats(&self) -> &[ColumnFormat] {
        &self.formats
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    pub fn line_count(&self) -> usize {
        self.line_map.size()
    }

    pub fn unfiltered_line_count(&self) -> usize {
        self.unfiltered_count
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// A cheap structural-sharing-friendly snapshot safe to hand to a
    /// `SearchingTask` while this `Index` keeps mutating. Bitmaps clone cheaply (roaring containers are
    /// shared where unmodified).
    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            formats: self.formats.clone(),
            unfiltered_count: self.unfiltered_count,
            filter: self.filter.clone(),
            line_map: self.line_map.clone(),
        }
    }

    /// Build per-column indexes. Returns `false` iff cancelled;
    /// a cancelled run leaves the previous index state untouched.
    pub fn build<R: SeekableRead>(
        &mut self,
        file: &mut FileParser<R>,
        parser: &dyn ILineParser,
        max_threads: usize,
        stop_requested: &dyn Fn() -> bool,
        progress: impl FnMut(usize, usize),
    ) -> CoreResult<bool> {
        log::trace!("Index::build over {} threads", max_threads);
        match parallel::build(file, parser, max_threads, stop_requested, progress)? {
            Some(columns) => {
                self.columns = columns;
                self.unfiltered_count = file.line_count();
                self.filter = None;
                self.active_filters.clear();
                self.line_map = LineMap::Identity(self.unfiltered_count);
                log::trace!("Index::build finished, {} lines", self.unfiltered_count);
                Ok(true)
            }
            None => {
                log::trace!("Index::build cancelled");
                Ok(false)
            }
        }
    }

    /// Replaces the current filter wholesale;
    /// result depends only on the set of (column, selected) pairs, not order.
    pub fn filter(&mut self, filters: Vec<ColumnFilter>) {
        log::trace!("Index::filter over {} column(s)", filters.len());
        match filter::apply(&self.columns, &filters) {
            Some(bits) => {
                self.line_map = LineMap::Filtered(filter::rebuild_line_map(&bits));
                self.filter = Some(bits);
            }
            None => {
                self.filter = None;
                self.line_map = LineMap::Identity(self.unfiltered_count);
            }
        }
        self.active_filters = filters;
    }

    /// The candidate range is the current filter
    /// (if any) else the full file; the result replaces the visible
    /// `LineMap` but never the underlying column filter.
    #[allow(clippy::too_many_arguments)]
    pub fn search<R: SeekableRead>(
        &mut self,
        file: &mut FileParser<R>,
        parser: &dyn ILineParser,
        text: &str,
        is_regex: bool,
        case_sensitive: bool,
        unicode_aware: bool,
        message_only: bool,
        hist: &Hist,
        stop_requested: &dyn Fn() -> bool,
        progress: impl FnMut(usize, usize),
    ) -> CoreResult<bool> {
        let searcher = Searcher::compile(text, is_regex, case_sensitive, unicode_aware)?;
        let candidates: Vec<u64> = self.line_map.iter().collect();
        let total = self.unfiltered_count.max(1);
        match search::run(
            file,
            parser,
            &self.formats,
            candidates.into_iter(),
            &searcher,
            message_only,
            hist,
            total,
            stop_requested,
            progress,
        )? {
            Some(bits) => {
                self.line_map = LineMap::Filtered(bits);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Enumerate a column's known values alongside filter/selection state.
    pub fn get_values(&self, column: usize) -> Vec<(String, bool, u64)> {
        let active = self.active_filters.iter().find(|f| f.column == column);
        self.columns[column]
            .values()
            .map(|(value, bits)| {
                let selected = active.map(|f| f.selected.contains(value)).unwrap_or(true);
                (value.to_string(), selected, bits.size() as u64)
            })
            .collect()
    }

    pub fn max_width(&self, column: usize) -> (usize, u64) {
        self.columns[column].max_width()
    }

    /// Swaps in a `LineMap` produced by a completed search against a
    /// snapshot of this index. The column filter itself is untouched: a
    /// search narrows the current view, it doesn't replace it.
    pub fn adopt_line_map(&mut self, map: LineMap) {
        self.line_map = map;
    }
}

/// Immutable view of an `Index` as of the moment it was taken, handed to a
/// `SearchingTask` so concurrent filter changes on the live `Index` don't
/// corrupt an in-flight search.
pub struct IndexSnapshot {
    formats: Vec<ColumnFormat>,
    unfiltered_count: usize,
    filter: Option<EwahBitSet>,
    line_map: LineMap,
}

impl IndexSnapshot {
    pub fn column_formats(&self) -> &[ColumnFormat] {
        &self.formats
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn search<R: SeekableRead>(
        &self,
        file: &mut FileParser<R>,
        parser: &dyn ILineParser,
        text: &str,
        is_regex: bool,
        case_sensitive: bool,
        unicode_aware: bool,
        message_only: bool,
        hist: &Hist,
        stop_requested: &dyn Fn() -> bool,
        progress: impl FnMut(usize, usize),
    ) -> CoreResult<Option<LineMap>> {
        let searcher = Searcher::compile(text, is_regex, case_sensitive, unicode_aware)?;
        let candidates: Vec<u64> = self.line_map.iter().collect();
        let total = self.unfiltered_count.max(1);
        let result = search::run(
            file,
            parser,
            &self.formats,
            candidates.into_iter(),
            &searcher,
            message_only,
            hist,
            total,
            stop_requested,
            progress,
        )?;
        Ok(result.map(LineMap::Filtered))
    }
}
