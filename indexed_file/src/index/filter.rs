//! Bitmap algebra for column filters.

use std::collections::HashSet;

use crate::bitset::{AppendOnlyBitSet, BitSet, EwahBitSet};

use super::column::ColumnIndex;

/// `{column, selected}` — one entry per column the user has constrained.
pub struct ColumnFilter {
    pub column: usize,
    pub selected: HashSet<String>,
}

/// Intersect each filter's per-value union.
/// An empty filter list returns `None`, meaning "no filter" (identity map).
pub fn apply(columns: &[ColumnIndex], filters: &[ColumnFilter]) -> Option<EwahBitSet> {
    if filters.is_empty() {
        return None;
    }
    let mut per_column = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = &columns[filter.column];
        let sets: Vec<&EwahBitSet> = filter
            .selected
            .iter()
            .filter_map(|v| column.get(v))
            .collect();
        per_column.push(EwahBitSet::union(sets));
    }
    let refs: Vec<&EwahBitSet> = per_column.iter().collect();
    Some(EwahBitSet::intersection(refs))
}

/// Rebuild the append-only `LineMap` bitset by walking `filter` in order
///.
pub fn rebuild_line_map(filter: &EwahBitSet) -> AppendOnlyBitSet {
    let mut map = AppendOnlyBitSet::new();
    for line in filter.iter() {
        map.add(line);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_with(values: &[(&str, &[u64])]) -> ColumnIndex {
        let mut col = ColumnIndex::new(true);
        for (value, lines) in values {
            let mut set = EwahBitSet::new();
            for &n in *lines {
                set.insert(n);
            }
            set.freeze();
            col.set(value.to_string(), set);
        }
        col
    }

    #[test]
    fn single_column_union() {
        let level = column_with(&[("INFO", &[0, 1, 3]), ("WARN", &[2]), ("ERR", &[4])]);
        let filters = vec![ColumnFilter {
            column: 0,
            selected: ["INFO".to_string()].into_iter().collect(),
        }];
        let result = apply(&[level], &filters).unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn intersection_across_columns() {
        let level = column_with(&[("INFO", &[0, 1, 3]), ("ERR", &[4])]);
        let component = column_with(&[("CORE", &[0, 2, 4])]);
        let filters = vec![
            ColumnFilter {
                column: 0,
                selected: ["INFO".to_string(), "ERR".to_string()].into_iter().collect(),
            },
            ColumnFilter {
                column: 1,
                selected: ["CORE".to_string()].into_iter().collect(),
            },
        ];
        let result = apply(&[level, component], &filters).unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[test]
    fn empty_filter_list_is_no_filter() {
        let level = column_with(&[("INFO", &[0, 1])]);
        assert!(apply(&[level], &[]).is_none());
    }

    #[test]
    fn order_of_filters_does_not_affect_result() {
        let level = column_with(&[("INFO", &[0, 1, 3]), ("ERR", &[4])]);
        let component = column_with(&[("CORE", &[0, 2, 4])]);
        let f1 = vec![
            ColumnFilter { column: 0, selected: ["INFO".to_string(), "ERR".to_string()].into_iter().collect() },
            ColumnFilter { column: 1, selected: ["CORE".to_string()].into_iter().collect() },
        ];
        let f2 = vec![
            ColumnFilter { column: 1, selected: ["CORE".to_string()].into_iter().collect() },
            ColumnFilter { column: 0, selected: ["INFO".to_string(), "ERR".to_string()].into_iter().collect() },
        ];
        let a = apply(&[column_with(&[("INFO", &[0, 1, 3]), ("ERR", &[4])]), column_with(&[("CORE", &[0, 2, 4])])], &f1).unwrap();
        let b = apply(&[level, component], &f2).unwrap();
        assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    }
}
