//! The precomputed segment intersection model.
//!
//! Crossing queries are by far the hottest operation in every heuristic, so
//! all pairwise crossings are evaluated once and packed into a bit matrix.

use crate::segments::{SegIdx, Segments};

/// A symmetric bit matrix recording which segment pairs cross.
///
/// Row `i` holds one bit per segment `j`; the bit is set iff segments `i` and
/// `j` cross. Both `(i, j)` and `(j, i)` are set at construction and the
/// diagonal is never set, so [`CrossingMap::crosses`] is symmetric and
/// irreflexive by construction. The map is immutable once built.
#[derive(Clone)]
pub struct CrossingMap {
    n: usize,
    /// Words per row.
    stride: usize,
    bits: Vec<u64>,
}

impl std::fmt::Debug for CrossingMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CrossingMap({} segments)", self.n)
    }
}

impl CrossingMap {
    fn empty(n: usize) -> Self {
        let stride = n.div_ceil(64);
        CrossingMap {
            n,
            stride,
            bits: vec![0; n * stride],
        }
    }

    fn set(&mut self, i: usize, j: usize) {
        self.bits[i * self.stride + j / 64] |= 1 << (j % 64);
        self.bits[j * self.stride + i / 64] |= 1 << (i % 64);
    }

    /// Evaluate the crossing predicate on every unordered segment pair.
    pub fn from_segments(segs: &Segments) -> Self {
        let mut ret = Self::empty(segs.len());
        for i in segs.indices() {
            for j in segs.indices().skip(i.0 + 1) {
                if segs[i].crosses(&segs[j]) {
                    ret.set(i.0, j.0);
                }
            }
        }
        ret
    }

    /// Build the map directly from an adjacency list of crossing pairs.
    ///
    /// Used for instances that carry no geometry. Pairs are zero-based here;
    /// the instance reader deals with the one-based wire format.
    pub fn from_edges(n: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut ret = Self::empty(n);
        for (i, j) in pairs {
            if i != j {
                ret.set(i, j);
            }
        }
        ret
    }

    /// The number of segments this map was built over.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Do segments `i` and `j` cross?
    #[inline]
    pub fn crosses(&self, i: SegIdx, j: SegIdx) -> bool {
        self.bits[i.0 * self.stride + j.0 / 64] & (1 << (j.0 % 64)) != 0
    }

    /// The crossing degree of segment `i`.
    pub fn degree(&self, i: SegIdx) -> usize {
        self.row(i).iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over all segments crossing `i`, in increasing index order.
    pub fn neighbors(&self, i: SegIdx) -> Neighbors<'_> {
        Neighbors {
            row: self.row(i),
            word_idx: 0,
            word: self.row(i).first().copied().unwrap_or(0),
        }
    }

    fn row(&self, i: SegIdx) -> &[u64] {
        &self.bits[i.0 * self.stride..(i.0 + 1) * self.stride]
    }
}

/// Iterator over the crossing neighbors of one segment.
///
/// Walks the packed row word by word, peeling one set bit at a time.
pub struct Neighbors<'a> {
    row: &'a [u64],
    word_idx: usize,
    word: u64,
}

impl Iterator for Neighbors<'_> {
    type Item = SegIdx;

    fn next(&mut self) -> Option<SegIdx> {
        while self.word == 0 {
            self.word_idx += 1;
            if self.word_idx >= self.row.len() {
                return None;
            }
            self.word = self.row[self.word_idx];
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(SegIdx(self.word_idx * 64 + bit))
    }
}
