//! Constructive coloring heuristics.
//!
//! Every heuristic builds a complete coloring by first-fit: each segment gets
//! the first color whose class it can join without a crossing, and a new
//! class is appended when none admits it. The variants differ only in the
//! order segments are processed, or (for [`DSatur`]) in how the color is
//! chosen among the admissible ones.

use log::debug;
use rand::Rng;

use crate::coloring::Coloring;
use crate::geom::{convex_hull, poly_area2, Point};
use crate::segments::SegIdx;
use crate::{Core, Error};

/// The algorithms selectable by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Algorithm {
    Greedy,
    Angle,
    Bad,
    DSatur,
    DSatHull,
    Conflict,
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Algorithm::Greedy),
            "angle" => Ok(Algorithm::Angle),
            "bad" => Ok(Algorithm::Bad),
            "dsatur" => Ok(Algorithm::DSatur),
            "dsathull" => Ok(Algorithm::DSatHull),
            "conflict" => Ok(Algorithm::Conflict),
            _ => Err(format!("unknown algorithm {s}")),
        }
    }
}

impl Algorithm {
    /// The name used on the command line and in solution filenames.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::Angle => "angle",
            Algorithm::Bad => "bad",
            Algorithm::DSatur => "dsatur",
            Algorithm::DSatHull => "dsathull",
            Algorithm::Conflict => "conflict",
        }
    }

    /// The constructive heuristic for this algorithm, or `None` for
    /// [`Algorithm::Conflict`], which is an optimizer rather than a
    /// constructor.
    pub fn constructive(&self) -> Option<Box<dyn Color>> {
        match self {
            Algorithm::Greedy => Some(Box::new(Greedy)),
            Algorithm::Angle => Some(Box::new(Angle)),
            Algorithm::Bad => Some(Box::new(Bad::default())),
            Algorithm::DSatur => Some(Box::new(DSatur::new(FirstFit))),
            Algorithm::DSatHull => Some(Box::new(DSatur::new(MinHullGrowth::default()))),
            Algorithm::Conflict => None,
        }
    }
}

/// The capability of producing a coloring from core state.
///
/// Heuristics are plain values; the ones that keep state between repetitions
/// (like [`Bad`]) carry it in their fields.
pub trait Color {
    /// Produce a complete, valid coloring.
    fn color(&mut self, core: &mut Core) -> Result<Coloring, Error>;
}

fn first_fit(core: &Core, order: impl IntoIterator<Item = SegIdx>) -> Coloring {
    let mut coloring = Coloring::new(core.len());
    for seg in order {
        coloring.assign_first_fit(&core.crossings, seg);
    }
    coloring
}

/// First-fit in reverse index order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl Color for Greedy {
    fn color(&mut self, core: &mut Core) -> Result<Coloring, Error> {
        let order: Vec<SegIdx> = (0..core.len()).rev().map(SegIdx).collect();
        Ok(first_fit(core, order))
    }
}

/// First-fit in slope order, started at a uniform-random rotation.
///
/// Different rotations explore genuinely different colorings, so this one is
/// worth repeating.
#[derive(Clone, Copy, Debug, Default)]
pub struct Angle;

impl Color for Angle {
    fn color(&mut self, core: &mut Core) -> Result<Coloring, Error> {
        let segs = core
            .segments
            .as_ref()
            .ok_or(Error::NoGeometry("the angle heuristic"))?;
        let sorted = segs.slope_order();
        let r = core.rng.gen_range(0..sorted.len());
        let order: Vec<SegIdx> = (0..sorted.len())
            .map(|i| sorted[(i + r) % sorted.len()])
            .collect();
        Ok(first_fit(core, order))
    }
}

/// Slope-ordered first-fit with a persistent good/bad split.
///
/// Every segment starts out good. Each pass colors all good segments first,
/// then all bad ones (both in slope order); afterwards the members of the
/// last class become the new bad set. Over repetitions this pushes the
/// troublemakers to the front of the class list.
#[derive(Clone, Debug, Default)]
pub struct Bad {
    bad: Vec<bool>,
}

impl Color for Bad {
    fn color(&mut self, core: &mut Core) -> Result<Coloring, Error> {
        let segs = core
            .segments
            .as_ref()
            .ok_or(Error::NoGeometry("the bad heuristic"))?;
        if self.bad.len() != core.len() {
            self.bad = vec![false; core.len()];
        }

        let sorted = segs.slope_order();
        let bad_count = self.bad.iter().filter(|b| **b).count();
        debug!("bad={} good={}", bad_count, core.len() - bad_count);

        let order: Vec<SegIdx> = sorted
            .iter()
            .filter(|idx| !self.bad[idx.0])
            .chain(sorted.iter().filter(|idx| self.bad[idx.0]))
            .copied()
            .collect();
        let coloring = first_fit(core, order);

        self.bad = vec![false; core.len()];
        if let Some(last) = coloring.classes().last() {
            for seg in last {
                self.bad[seg.0] = true;
            }
        }
        Ok(coloring)
    }
}

/// How a DSatur run picks a color once a segment is selected.
pub trait ColorChoice {
    /// Reset any per-run state.
    fn reset(&mut self) {}

    /// Pick a color for `seg`.
    ///
    /// `forbidden[c]` is true when some colored neighbor of `seg` already has
    /// color `c`; it may be shorter than `num_classes`. Returning
    /// `num_classes` opens a fresh class.
    fn choose(
        &mut self,
        core: &Core,
        seg: SegIdx,
        forbidden: &[bool],
        num_classes: usize,
    ) -> Result<usize, Error>;
}

/// The plain DSatur color rule: the first admissible color.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstFit;

impl ColorChoice for FirstFit {
    fn choose(
        &mut self,
        _core: &Core,
        _seg: SegIdx,
        forbidden: &[bool],
        num_classes: usize,
    ) -> Result<usize, Error> {
        Ok((0..num_classes)
            .find(|&c| c >= forbidden.len() || !forbidden[c])
            .unwrap_or(num_classes))
    }
}

/// Pick the admissible class whose convex hull grows the least.
///
/// Each class keeps the hull of its endpoint set; a candidate's growth is the
/// difference in twice-signed hull area after adding the segment's
/// endpoints. Keeping classes geometrically tight tends to leave room for
/// later segments.
#[derive(Clone, Debug, Default)]
pub struct MinHullGrowth {
    hulls: Vec<Vec<Point>>,
}

impl MinHullGrowth {
    fn grown(hull: &[Point], p: Point, q: Point) -> Vec<Point> {
        let mut points = hull.to_vec();
        if !points.contains(&p) {
            points.push(p);
        }
        if !points.contains(&q) {
            points.push(q);
        }
        convex_hull(points)
    }
}

impl ColorChoice for MinHullGrowth {
    fn reset(&mut self) {
        self.hulls.clear();
    }

    fn choose(
        &mut self,
        core: &Core,
        seg: SegIdx,
        forbidden: &[bool],
        num_classes: usize,
    ) -> Result<usize, Error> {
        let segs = core
            .segments
            .as_ref()
            .ok_or(Error::NoGeometry("the dsathull heuristic"))?;
        let (p, q) = (*segs[seg].p(), *segs[seg].q());
        debug_assert_eq!(self.hulls.len(), num_classes);

        let admissible: Vec<usize> = (0..self.hulls.len())
            .filter(|&c| c >= forbidden.len() || !forbidden[c])
            .collect();
        if admissible.is_empty() {
            self.hulls.push(vec![p, q]);
            return Ok(self.hulls.len() - 1);
        }

        let mut best = admissible[0];
        let mut best_diff = i64::MAX;
        for c in admissible {
            let before = poly_area2(&self.hulls[c]);
            let after = poly_area2(&Self::grown(&self.hulls[c], p, q));
            if after - before < best_diff {
                best = c;
                best_diff = after - before;
            }
        }
        self.hulls[best] = Self::grown(&self.hulls[best], p, q);
        Ok(best)
    }
}

/// DSatur: dynamic saturation-first ordering.
///
/// Repeatedly color an uncolored segment whose crossing neighbors already
/// use the most distinct colors, breaking ties by higher crossing degree and
/// then uniformly at random among the top eight. The color rule is a
/// strategy value, so the hull-guided variant is the same driver with a
/// different [`ColorChoice`].
#[derive(Clone, Debug)]
pub struct DSatur<C> {
    choice: C,
}

impl<C: ColorChoice> DSatur<C> {
    /// A DSatur driver with the given color rule.
    pub fn new(choice: C) -> Self {
        DSatur { choice }
    }
}

impl<C: ColorChoice> Color for DSatur<C> {
    fn color(&mut self, core: &mut Core) -> Result<Coloring, Error> {
        self.choice.reset();
        let n = core.len();
        let degree: Vec<usize> = (0..n).map(|i| core.crossings.degree(SegIdx(i))).collect();
        let mut dsat = vec![0u32; n];
        let mut neighbor_colors: Vec<Vec<bool>> = vec![Vec::new(); n];
        let mut colored = vec![false; n];
        let mut coloring = Coloring::new(n);

        for _ in 0..n {
            let max_dsat = (0..n)
                .filter(|&i| !colored[i])
                .map(|i| dsat[i])
                .max()
                .unwrap();
            let mut candidates: Vec<(usize, usize)> = (0..n)
                .filter(|&i| !colored[i] && dsat[i] == max_dsat)
                .map(|i| (degree[i], i))
                .collect();
            candidates.sort_by_key(|&(deg, i)| (std::cmp::Reverse(deg), i));
            let r = core.rng.gen_range(0..candidates.len().min(8));
            let vi = candidates[r].1;

            let c = self.choice.choose(
                core,
                SegIdx(vi),
                &neighbor_colors[vi],
                coloring.num_colors(),
            )?;
            coloring.place(c, SegIdx(vi));
            colored[vi] = true;
            neighbor_colors[vi] = Vec::new();

            for u in core.crossings.neighbors(SegIdx(vi)) {
                if colored[u.0] {
                    continue;
                }
                let nc = &mut neighbor_colors[u.0];
                if nc.len() <= c {
                    nc.resize(c + 1, false);
                }
                if !nc[c] {
                    nc[c] = true;
                    dsat[u.0] += 1;
                }
            }
        }
        Ok(coloring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossings::CrossingMap;
    use crate::segments::Segments;

    fn geometry_core(pairs: Vec<((i64, i64), (i64, i64))>, seed: u64) -> Core {
        let segs = Segments::from_pairs(pairs);
        let map = CrossingMap::from_segments(&segs);
        Core::seeded(Some(segs), map, seed)
    }

    fn k5_core(seed: u64) -> Core {
        let pairs = (0..5).flat_map(|i| (i + 1..5).map(move |j| (i, j)));
        Core::seeded(None, CrossingMap::from_edges(5, pairs), seed)
    }

    fn all_constructives() -> Vec<Box<dyn Color>> {
        [
            Algorithm::Greedy,
            Algorithm::Angle,
            Algorithm::Bad,
            Algorithm::DSatur,
            Algorithm::DSatHull,
        ]
        .iter()
        .map(|a| a.constructive().unwrap())
        .collect()
    }

    #[test]
    fn disjoint_segments_get_one_color() {
        for (i, mut h) in all_constructives().into_iter().enumerate() {
            let mut core = geometry_core(
                vec![((0, 0), (2, 0)), ((3, 0), (5, 0)), ((6, 0), (8, 0))],
                i as u64,
            );
            let coloring = h.color(&mut core).unwrap();
            assert_eq!(coloring.num_colors(), 1);
            assert!(coloring.is_valid(&core.crossings));
        }
    }

    #[test]
    fn crossing_pair_needs_two_colors() {
        for (i, mut h) in all_constructives().into_iter().enumerate() {
            let mut core = geometry_core(vec![((0, 0), (10, 0)), ((5, -5), (5, 5))], i as u64);
            let coloring = h.color(&mut core).unwrap();
            assert_eq!(coloring.num_colors(), 2);
        }
    }

    #[test]
    fn fan_through_apex_gets_one_color() {
        let pairs: Vec<_> = (0..6i64).map(|i| ((0, 0), (10, i))).collect();
        for (i, mut h) in all_constructives().into_iter().enumerate() {
            let mut core = geometry_core(pairs.clone(), i as u64);
            let coloring = h.color(&mut core).unwrap();
            assert_eq!(coloring.num_colors(), 1);
        }
    }

    #[test]
    fn pierced_triangle_needs_two_colors() {
        // A triangle and a diagonal through its interior crossing all three
        // sides.
        let mut core = geometry_core(
            vec![
                ((0, 0), (12, 0)),
                ((0, 0), (6, 12)),
                ((12, 0), (6, 12)),
                ((-2, 3), (14, 3)),
            ],
            3,
        );
        for mut h in all_constructives() {
            let coloring = h.color(&mut core).unwrap();
            assert_eq!(coloring.num_colors(), 2);
            assert!(coloring.is_valid(&core.crossings));
        }
    }

    #[test]
    fn complete_graph_needs_all_colors() {
        // Adjacency-only instance: geometry-free heuristics must cope.
        for algo in [Algorithm::Greedy, Algorithm::DSatur] {
            let mut core = k5_core(7);
            let coloring = algo.constructive().unwrap().color(&mut core).unwrap();
            assert_eq!(coloring.num_colors(), 5);
        }
    }

    #[test]
    fn geometry_heuristics_reject_adjacency_instances() {
        for algo in [Algorithm::Angle, Algorithm::Bad, Algorithm::DSatHull] {
            let mut core = k5_core(7);
            assert!(matches!(
                algo.constructive().unwrap().color(&mut core),
                Err(Error::NoGeometry(_))
            ));
        }
    }

    #[test]
    fn bad_carries_state_between_repetitions() {
        let mut core = geometry_core(
            vec![
                ((0, 0), (10, 10)),
                ((0, 10), (10, 0)),
                ((0, 5), (10, 5)),
                ((20, 0), (30, 0)),
            ],
            11,
        );
        let mut bad = Bad::default();
        let first = bad.color(&mut core).unwrap();
        assert!(bad.bad.iter().any(|b| *b));
        let second = bad.color(&mut core).unwrap();
        assert!(second.num_colors() <= first.num_colors());
        assert!(second.is_valid(&core.crossings));
    }

    #[test]
    fn seeded_runs_reproduce() {
        let pairs: Vec<_> = (0..8)
            .map(|i| ((i, 0), (7 - i, 9)))
            .map(|((a, b), (c, d))| ((a as i64, b as i64), (c as i64, d as i64)))
            .collect();
        let run = |seed| {
            let mut core = geometry_core(pairs.clone(), seed);
            DSatur::new(FirstFit)
                .color(&mut core)
                .unwrap()
                .color_of()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn algorithm_names_round_trip() {
        for name in ["greedy", "angle", "bad", "dsatur", "dsathull", "conflict"] {
            let algo: Algorithm = name.parse().unwrap();
            assert_eq!(algo.name(), name);
        }
        assert!("tabu".parse::<Algorithm>().is_err());
    }
}
