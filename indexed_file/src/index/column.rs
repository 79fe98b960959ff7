//! Per-column value → line-number bitmap.

use std::collections::BTreeMap;

use crate::bitset::{BitSet, EwahBitSet};

pub struct ColumnIndex {
    values: BTreeMap<String, EwahBitSet>,
    indexed: bool,
    /// (grapheme width, line number) of the widest value seen, computed
    /// during reduction over the whole file, not just failing lines.
    max_width: (usize, u64),
}

impl ColumnIndex {
    pub fn new(indexed: bool) -> Self {
        Self {
            values: BTreeMap::new(),
            indexed,
            max_width: (0, 0),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn note_width(&mut self, width: usize, line: u64) {
        if width > self.max_width.0 {
            self.max_width = (width, line);
        }
    }

    pub fn max_width(&self) -> (usize, u64) {
        self.max_width
    }

    /// Replace (or insert) the bitmap for `value`, already consolidated for
    /// multi-line continuations and frozen for random access.
    pub fn set(&mut self, value: String, bits: EwahBitSet) {
        self.values.insert(value, bits);
    }

    pub fn get(&self, value: &str) -> Option<&EwahBitSet> {
        self.values.get(value)
    }

    /// Values in sorted order, paired with their set's cardinality.
    pub fn values(&self) -> impl Iterator<Item = (&str, &EwahBitSet)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}
