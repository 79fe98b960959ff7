//! The append-only bit set backing `LineMap`.
//!
//! Set bits are appended in strictly non-decreasing order only. Storage is
//! bucketed by a fixed logical width so that a sparse filter over a huge
//! file doesn't pay for one `Vec` entry per unfiltered line: each bucket
//! covers `WIDTH` consecutive line numbers and stores only the offsets
//! that are actually set, relative to the bucket's base.

use super::BitSet;

const WIDTH: u64 = 4096;

#[derive(Debug, Default, Clone)]
pub struct AppendOnlyBitSet {
    /// One entry per non-empty bucket: (bucket index, relative offsets).
    buckets: Vec<(u64, Vec<u32>)>,
    /// Cumulative set-bit count *before* each bucket, parallel to `buckets`.
    prefix: Vec<usize>,
    len: usize,
    last: Option<u64>,
}

impl AppendOnlyBitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `n` to the set. `n` must be >= the last added value.
    pub fn add(&mut self, n: u64) {
        if let Some(last) = self.last {
            assert!(n >= last, "AppendOnlyBitSet::add requires non-decreasing input");
        }
        let bucket_ix = n / WIDTH;
        let rel = (n % WIDTH) as u32;
        match self.buckets.last_mut() {
            Some((ix, offsets)) if *ix == bucket_ix => offsets.push(rel),
            _ => {
                self.prefix.push(self.len);
                self.buckets.push((bucket_ix, vec![rel]));
            }
        }
        self.len += 1;
        self.last = Some(n);
    }

    fn bucket_for_rank(&self, k: usize) -> (usize, usize) {
        // Find the last bucket whose prefix count is <= k.
        let idx = match self.prefix.binary_search(&k) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (idx, k - self.prefix[idx])
    }
}

impl BitSet for AppendOnlyBitSet {
    fn size(&self) -> usize {
        self.len
    }

    fn get(&self, k: usize) -> u64 {
        assert!(k < self.len, "AppendOnlyBitSet::get index out of range");
        let (bucket_idx, within) = self.bucket_for_rank(k);
        let (base, offsets) = &self.buckets[bucket_idx];
        base * WIDTH + offsets[within] as u64
    }

    fn contains(&self, n: u64) -> bool {
        let bucket_ix = n / WIDTH;
        match self.buckets.binary_search_by_key(&bucket_ix, |(ix, _)| *ix) {
            Ok(i) => self.buckets[i].1.contains(&((n % WIDTH) as u32)),
            Err(_) => false,
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.buckets.iter().flat_map(|(base, offsets)| {
            let base = *base;
            offsets.iter().map(move |rel| base * WIDTH + *rel as u64)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::tests::check_random_access;

    #[test]
    fn empty() {
        let set = AppendOnlyBitSet::new();
        assert_eq!(set.size(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn monotone_add_and_get() {
        let mut set = AppendOnlyBitSet::new();
        for n in [0u64, 1, 2, 5, 4096, 4097, 9000, 1_000_000] {
            set.add(n);
        }
        assert_eq!(set.size(), 8);
        check_random_access(&set);
        assert!(set.contains(4097));
        assert!(!set.contains(4098));
    }

    #[test]
    fn sparse_across_many_buckets() {
        let mut set = AppendOnlyBitSet::new();
        let values: Vec<u64> = (0..2000).map(|i| i * 10_007).collect();
        for v in &values {
            set.add(*v);
        }
        check_random_access(&set);
    }

    #[test]
    #[should_panic]
    fn add_requires_non_decreasing() {
        let mut set = AppendOnlyBitSet::new();
        set.add(10);
        set.add(5);
    }
}
