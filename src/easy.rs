//! Degree peeling: setting aside segments that are easy to color.
//!
//! If a coloring with `bound` colors exists for the hard part of an
//! instance, any segment with fewer than `bound` crossing neighbors can
//! always be colored afterwards, because its neighbors cannot occupy every
//! color. Removing such segments (and re-checking, since removal lowers its
//! neighbors' degrees) shrinks the problem the conflict optimizer has to
//! fight with. The removed segments must be re-inserted in reverse removal
//! order.

use log::debug;

use crate::coloring::admits;
use crate::crossings::CrossingMap;
use crate::segments::SegIdx;

/// Repeatedly remove the remaining segment of smallest crossing degree while
/// that degree is below `bound`.
///
/// Removed segments are stripped from `classes` and returned in removal
/// order.
pub fn peel(map: &CrossingMap, classes: &mut Vec<Vec<SegIdx>>, bound: usize) -> Vec<SegIdx> {
    let n = map.len();
    let mut degree: Vec<i64> = (0..n).map(|i| map.degree(SegIdx(i)) as i64).collect();
    let mut removed = Vec::new();

    loop {
        let s = match (0..n).min_by_key(|&i| degree[i]) {
            Some(s) if degree[s] < bound as i64 => s,
            _ => break,
        };
        degree[s] = i64::MAX;
        removed.push(SegIdx(s));
        for u in map.neighbors(SegIdx(s)) {
            if degree[u.0] != i64::MAX {
                degree[u.0] -= 1;
            }
        }
    }

    let mut is_removed = vec![false; n];
    for seg in &removed {
        is_removed[seg.0] = true;
    }
    for class in classes.iter_mut() {
        class.retain(|seg| !is_removed[seg.0]);
    }

    debug!("peeled {} easy segments", removed.len());
    removed
}

/// Re-insert peeled segments, draining `easy` in reverse removal order.
///
/// Each segment goes to the first class that admits it. No new classes are
/// opened: peeling guarantees an admissible class exists, so failing to find
/// one is a bug.
///
/// # Panics
///
/// Panics if some segment admits no class.
pub fn reinsert(map: &CrossingMap, classes: &mut [Vec<SegIdx>], easy: &mut Vec<SegIdx>) {
    debug!("re-inserting {} easy segments", easy.len());
    while let Some(seg) = easy.pop() {
        let class = classes
            .iter_mut()
            .find(|class| admits(map, class, seg))
            .unwrap_or_else(|| panic!("no admissible class for easy segment {seg:?}"));
        class.push(seg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::Coloring;

    /// A 4-cycle plus a pendant segment hanging off index 0.
    fn c4_pendant() -> CrossingMap {
        CrossingMap::from_edges(5, vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 4)])
    }

    #[test]
    fn peel_removes_low_degree_segments_first() {
        let map = c4_pendant();
        let mut classes: Vec<Vec<SegIdx>> = Vec::new();
        let removed = peel(&map, &mut classes, 2);
        // The pendant (degree 1) goes first; that drops segment 0 to degree
        // 2, so nothing else falls below the bound.
        assert_eq!(removed, vec![SegIdx(4)]);
    }

    #[test]
    fn peel_cascades() {
        // A path: peeling one end unravels the whole thing.
        let map = CrossingMap::from_edges(4, vec![(0, 1), (1, 2), (2, 3)]);
        let mut classes: Vec<Vec<SegIdx>> = Vec::new();
        let removed = peel(&map, &mut classes, 2);
        assert_eq!(removed.len(), 4);
    }

    #[test]
    fn peel_then_reinsert_restores_a_valid_coloring() {
        let map = c4_pendant();
        let mut coloring = Coloring::new(5);
        for i in 0..5 {
            coloring.assign_first_fit(&map, SegIdx(i));
        }
        let before = coloring.num_colors();

        let mut classes = coloring.into_classes();
        let mut easy = peel(&map, &mut classes, before);
        assert!(!easy.is_empty());
        reinsert(&map, &mut classes, &mut easy);
        assert!(easy.is_empty());

        let after = Coloring::from_classes(5, classes);
        assert!(after.is_valid(&map));
        assert!(after.num_colors() <= before);
    }

    #[test]
    #[should_panic(expected = "no admissible class")]
    fn reinsert_without_room_is_a_bug() {
        let map = CrossingMap::from_edges(2, vec![(0, 1)]);
        let mut classes = vec![vec![SegIdx(0)]];
        let mut easy = vec![SegIdx(1)];
        reinsert(&map, &mut classes, &mut easy);
    }
}
