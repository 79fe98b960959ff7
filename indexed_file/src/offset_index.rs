//! Compact line-number -> byte-offset mapping.
//!
//! Storing every offset costs 8 bytes/line; storing every `D`th offset and
//! re-scanning forward the rest costs <1% lookup time for typical line
//! lengths and shrinks the index `D`-fold. `D` must be a power of two so
//! `map` can use a shift instead of a division on the hot path.
//!
//! `map` takes `&mut self` because resolving an unstored offset calls back
//! into `next_offset`, which performs real I/O (seek + scan for `\n`) and so
//! needs mutable access to its captured reader. Callers that need this
//! under concurrent read access (e.g. `FileParser::read_line`) serialize
//! through their own mutex.

pub type NextOffsetFn = Box<dyn FnMut(usize) -> std::io::Result<usize> + Send>;

pub struct OffsetIndex {
    delta: usize,
    shift: u32,
    stored: Vec<usize>,
    count: usize,
    next_offset: Option<NextOffsetFn>,
}

impl Default for OffsetIndex {
    fn default() -> Self {
        Self {
            delta: 1,
            shift: 0,
            stored: Vec::new(),
            count: 0,
            next_offset: None,
        }
    }
}

impl OffsetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh index with sparsity `delta` (must be a power of two)
    /// and the callback used to advance one line from a given byte offset.
    pub fn reset(&mut self, delta: usize, next_offset: NextOffsetFn) {
        assert!(delta.is_power_of_two(), "OffsetIndex delta must be a power of two");
        self.delta = delta;
        self.shift = delta.trailing_zeros();
        self.stored.clear();
        self.count = 0;
        self.next_offset = Some(next_offset);
    }

    /// Append the offset of line `size()` (i.e. the next line in sequence).
    /// Only physically stored if `size()` is currently a multiple of `delta`.
    pub fn add(&mut self, offset: usize) {
        if self.count % self.delta == 0 {
            self.stored.push(offset);
        }
        self.count += 1;
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Resolve the byte offset of logical line `i`, re-scanning forward
    /// from the nearest stored boundary via `next_offset` as needed.
    pub fn map(&mut self, i: usize) -> std::io::Result<usize> {
        assert!(i < self.count, "OffsetIndex::map index out of range");
        let bucket = i >> self.shift;
        let mut offset = self.stored[bucket];
        let remaining = i - (bucket << self.shift);
        let next_offset = self
            .next_offset
            .as_mut()
            .expect("OffsetIndex::reset must be called before map");
        for _ in 0..remaining {
            offset = next_offset(offset)?;
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an OffsetIndex over a synthetic file of fixed-width lines so
    /// `next_offset` is a pure function of its input, independent of any
    /// real I/O.
    fn fixed_width_index(delta: usize, line_width: usize, lines: usize) -> OffsetIndex {
        let mut idx = OffsetIndex::new();
        idx.reset(
            delta,
            Box::new(move |offset: usize| Ok(offset + line_width)),
        );
        for i in 0..lines {
            idx.add(i * line_width);
        }
        idx
    }

    #[test]
    fn round_trips_naive_offsets() {
        for delta in [1usize, 2, 4, 32] {
            let mut idx = fixed_width_index(delta, 7, 500);
            for i in 0..500 {
                assert_eq!(idx.map(i).unwrap(), i * 7, "delta={delta} line={i}");
            }
        }
    }

    #[test]
    fn size_tracks_add_calls() {
        let idx = fixed_width_index(32, 10, 100);
        assert_eq!(idx.size(), 100);
    }

    #[test]
    #[should_panic]
    fn delta_must_be_power_of_two() {
        let mut idx = OffsetIndex::new();
        idx.reset(3, Box::new(|o| Ok(o + 1)));
    }
}
