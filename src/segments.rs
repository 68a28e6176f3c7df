use ordered_float::OrderedFloat;

use crate::geom::{Point, Segment};

/// An index into our segment arena.
///
/// Throughout this library, segments are identified by their index; all of
/// the coloring machinery works on indices and never on segment values. The
/// index is used to look the segment up in [`Segments`], and to address the
/// rows of a [`crate::CrossingMap`]. (This index-as-identifier breaks down if
/// there are multiple `Segments` in flight. Just be careful not to mix them
/// up.)
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SegIdx(pub usize);

impl std::fmt::Debug for SegIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s_{}", self.0)
    }
}

/// An arena of line segments.
///
/// Segments are indexed by [`SegIdx`] and can be retrieved by indexing (i.e.
/// with square brackets). Duplicate segments are allowed; they are distinct
/// entries that happen to compare equal.
#[derive(Debug, Clone, Default)]
pub struct Segments {
    segs: Vec<Segment>,
}

impl Segments {
    /// The number of line segments in this arena.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.segs.len()
    }

    /// Iterate over all indices that can be used to index into this arena.
    pub fn indices(&self) -> impl Iterator<Item = SegIdx> {
        (0..self.segs.len()).map(SegIdx)
    }

    /// Iterate over all segments in this arena.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segs.iter()
    }

    /// Add a segment, returning its index.
    pub fn push(&mut self, seg: Segment) -> SegIdx {
        self.segs.push(seg);
        SegIdx(self.segs.len() - 1)
    }

    /// Build an arena from endpoint pairs.
    pub fn from_pairs<P: Into<Point>>(pairs: impl IntoIterator<Item = (P, P)>) -> Self {
        let mut ret = Self::default();
        for (p, q) in pairs {
            ret.push(Segment::new(p.into(), q.into()));
        }
        ret
    }

    /// All indices, sorted by segment slope (ascending) with ties broken by
    /// index.
    ///
    /// This is the processing order shared by the angle-ordered heuristics.
    pub fn slope_order(&self) -> Vec<SegIdx> {
        let mut order: Vec<SegIdx> = self.indices().collect();
        order.sort_by_key(|idx| (OrderedFloat(self[*idx].slope()), idx.0));
        order
    }
}

impl std::ops::Index<SegIdx> for Segments {
    type Output = Segment;

    fn index(&self, index: SegIdx) -> &Self::Output {
        &self.segs[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_order_sorts_ascending_with_index_ties() {
        // Slopes: 1.0, -1.0, 0.0, 0.0.
        let segs = Segments::from_pairs(vec![
            ((0, 0), (2, 2)),
            ((0, 2), (2, 0)),
            ((0, 0), (5, 0)),
            ((1, 1), (4, 1)),
        ]);
        let order = segs.slope_order();
        assert_eq!(order, vec![SegIdx(1), SegIdx(2), SegIdx(3), SegIdx(0)]);
    }

    #[test]
    fn index_debug_is_compact() {
        assert_eq!(format!("{:?}", SegIdx(7)), "s_7");
    }
}
