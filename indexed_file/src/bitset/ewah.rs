//! Random-access, algebra-capable bit set.
//!
//! Backed by `roaring::RoaringTreemap`, which is this corpus's idiomatic
//! stand-in for an Enhanced Word-Aligned Hybrid bitmap: word-aligned runs
//! under the hood and O(1) amortized union/intersection/difference.
//! `RoaringTreemap` splits a `u64` key into a high 32 bits (selecting one of
//! its inner `RoaringBitmap`s) and a low 32 bits (the key within that
//! bitmap), and each `RoaringBitmap` already implements `select(rank)` as a
//! binary search over its own containers rather than a linear scan. The
//! bucket table here just records, per inner bitmap, the set-bit count
//! accumulated before it, so `get(k)` can jump straight to the one inner
//! bitmap holding the `k`th set bit and hand the corrected local rank to its
//! `select`, instead of re-walking the whole treemap from element zero.

use roaring::RoaringTreemap;

use super::BitSet;

#[derive(Debug, Clone, Default)]
pub struct EwahBitSet {
    bitmap: RoaringTreemap,
    /// One entry per non-empty inner 32-bit bitmap, in ascending key order:
    /// (high 32 bits, set-bit count accumulated strictly before it).
    buckets: Vec<(u32, u64)>,
    dirty: bool,
}

impl EwahBitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sorted(values: impl IntoIterator<Item = u64>) -> Self {
        let mut bitmap = RoaringTreemap::new();
        for v in values {
            bitmap.insert(v);
        }
        let mut set = Self { bitmap, buckets: Vec::new(), dirty: true };
        set.rebuild_buckets();
        set
    }

    pub fn insert(&mut self, n: u64) -> bool {
        let inserted = self.bitmap.insert(n);
        if inserted {
            self.dirty = true;
        }
        inserted
    }

    fn rebuild_buckets(&mut self) {
        if !self.dirty {
            return;
        }
        self.buckets.clear();
        let mut cumulative = 0u64;
        for (high, inner) in self.bitmap.bitmaps() {
            self.buckets.push((high, cumulative));
            cumulative += inner.len();
        }
        self.dirty = false;
    }

    /// Must be called (or triggered implicitly by `get`/`iter`) before
    /// random access after a burst of inserts.
    pub fn freeze(&mut self) {
        self.rebuild_buckets();
    }

    pub fn popcount(&self) -> u64 {
        self.bitmap.len()
    }

    pub fn union<'a>(sets: impl IntoIterator<Item = &'a EwahBitSet>) -> EwahBitSet {
        let mut acc = RoaringTreemap::new();
        for s in sets {
            acc |= &s.bitmap;
        }
        EwahBitSet::from_sorted(acc)
    }

    pub fn intersection<'a>(sets: impl IntoIterator<Item = &'a EwahBitSet>) -> EwahBitSet {
        let mut iter = sets.into_iter();
        let Some(first) = iter.next() else {
            return EwahBitSet::new();
        };
        let mut acc = first.bitmap.clone();
        for s in iter {
            acc &= &s.bitmap;
        }
        EwahBitSet::from_sorted(acc)
    }

    pub fn difference(a: &EwahBitSet, b: &EwahBitSet) -> EwahBitSet {
        let acc = &a.bitmap - &b.bitmap;
        EwahBitSet::from_sorted(acc)
    }
}

impl BitSet for EwahBitSet {
    fn size(&self) -> usize {
        self.bitmap.len() as usize
    }

    fn get(&self, k: usize) -> u64 {
        assert!(!self.dirty, "EwahBitSet::get called before freeze()");
        assert!(k < self.size(), "EwahBitSet::get index out of range");
        let k = k as u64;
        // Last bucket whose cumulative count is <= k.
        let bucket_idx = match self.buckets.binary_search_by(|(_, cumulative)| cumulative.cmp(&k)) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let (high, cumulative) = self.buckets[bucket_idx];
        let local_rank = (k - cumulative) as u32;
        let (_, inner) = self
            .bitmap
            .bitmaps()
            .nth(bucket_idx)
            .expect("bucket table is consistent with the bitmap");
        let low = inner
            .select(local_rank)
            .expect("bucket table is consistent with the bitmap");
        ((high as u64) << 32) | low as u64
    }

    fn contains(&self, n: u64) -> bool {
        self.bitmap.contains(n)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.bitmap.iter())
    }
}

impl FromIterator<u64> for EwahBitSet {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        EwahBitSet::from_sorted(iter)
    }
}
