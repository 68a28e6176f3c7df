//! The conflict optimizer: iterative color-class elimination.
//!
//! Starting from any valid coloring, the optimizer repeatedly tries to empty
//! one color class. Its members are re-homed by a scored move that prefers
//! classes whose conflicting occupants have not been displaced much yet;
//! displaced segments go back into a queue, and a bounded DFS tries to mop
//! up stragglers by exchanging a few segments between classes. If the queue
//! ever gets stuck the whole attempt is rolled back, so the color count
//! never increases.

use std::collections::VecDeque;

use log::{debug, info};
use rand_distr::{Distribution, Normal};

use crate::coloring::{admits, Coloring};
use crate::easy;
use crate::params::Parameters;
use crate::segments::SegIdx;
use crate::{Clock, Core, Error};

/// The exponent schedule cycled by `loop` mode.
const POWER_LOOP: [f64; 5] = [1.1, 1.2, 1.3, 1.5, 2.0];

/// Shuffle sweeps per pass; improvements restart the count.
const SHUFFLE_ROUNDS: usize = 11;

/// Conflicts tolerated per trial class in the DFS repair.
const DFS_BREADTH: usize = 3;

/// The wall-clock budget ran out in the middle of a class elimination.
///
/// The half-finished attempt is abandoned rather than restored; the caller
/// is expected to stop using the optimizer and exit cleanly. The last
/// improvement has already been reported through the `run` callback. (Outer
/// loops never raise this: they notice the expired clock between attempts
/// and return normally.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

impl std::fmt::Display for Exhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wall-clock budget exhausted mid-elimination")
    }
}

/// One reversible mutation of the class list, for the DFS event log.
#[derive(Debug, Clone, Copy)]
enum Event {
    Added { class: usize, seg: SegIdx },
    Removed { class: usize, seg: SegIdx },
}

fn remove_seg(class: &mut Vec<SegIdx>, seg: SegIdx) {
    if let Some(pos) = class.iter().position(|&t| t == seg) {
        class.remove(pos);
    }
}

/// A first-fit coloring in index order; the conflict optimizer's default
/// starting point when no warm-start solution is given.
pub fn first_fit_coloring(core: &Core) -> Coloring {
    let mut coloring = Coloring::new(core.len());
    for i in 0..core.len() {
        coloring.assign_first_fit(&core.crossings, SegIdx(i));
    }
    coloring
}

/// The optimizer state for one run.
pub struct Optimizer<'a> {
    core: &'a mut Core,
    params: Parameters,
    clock: Clock,
    classes: Vec<Vec<SegIdx>>,
    /// How often each segment has been displaced in the current attempt;
    /// clique members are pinned to the maximum so they are never chosen.
    queue_count: Vec<u64>,
    easy_segs: Vec<SegIdx>,
    noise: Normal<f64>,
    power: f64,
    loop_index: u64,
}

impl<'a> Optimizer<'a> {
    /// Set up an optimizer over `coloring`.
    ///
    /// The clock should have been started when the instance was loaded, so
    /// that reported times line up with the solution metadata.
    pub fn new(
        core: &'a mut Core,
        coloring: Coloring,
        params: &Parameters,
        clock: Clock,
    ) -> Result<Self, Error> {
        let noise = Normal::new(params.noise_mean, params.noise_var)
            .map_err(|e| Error::Malformed(format!("bad noise parameters: {e}")))?;
        let n = core.len();
        let power = if params.loop_enabled {
            POWER_LOOP[0]
        } else {
            params.power
        };
        Ok(Optimizer {
            core,
            params: params.clone(),
            clock,
            classes: coloring.into_classes(),
            queue_count: vec![0; n],
            easy_segs: Vec::new(),
            noise,
            power,
            loop_index: 0,
        })
    }

    /// The current coloring.
    pub fn coloring(&self) -> Coloring {
        Coloring::from_classes(self.core.len(), self.classes.clone())
    }

    /// Run until the clock expires, reporting every improvement.
    ///
    /// `on_improve` receives the improved coloring and the elapsed seconds;
    /// persisting it is the caller's business. On [`Exhausted`] the caller
    /// should terminate: the in-memory coloring is mid-attempt and no longer
    /// meaningful, but everything worth keeping has been reported already.
    pub fn run(
        &mut self,
        mut on_improve: impl FnMut(&Coloring, f64),
    ) -> Result<(), Exhausted> {
        if !self.core.clique.is_empty() && self.core.clique.len() == self.classes.len() {
            info!(
                "coloring matches the clique bound ({}); provably optimal",
                self.classes.len()
            );
            return Ok(());
        }

        while !self.clock.expired() {
            if self.optimize_once()? {
                let coloring = self.coloring();
                info!("improved to {} colors", coloring.num_colors());
                on_improve(&coloring, self.clock.elapsed());
            }
        }
        Ok(())
    }

    /// One attempt: peel, then alternate shuffle and elimination until the
    /// color count drops or the clock expires.
    fn optimize_once(&mut self) -> Result<bool, Exhausted> {
        if self.params.easy {
            let bound = self.classes.len().saturating_sub(1);
            self.easy_segs = easy::peel(&self.core.crossings, &mut self.classes, bound);
        }

        loop {
            let before = self.classes.len();
            self.shuffle();
            self.eliminate()?;
            if self.classes.len() < before {
                self.reinsert_easy();
                return Ok(true);
            }
            if self.clock.expired() {
                self.reinsert_easy();
                return Ok(false);
            }
        }
    }

    fn reinsert_easy(&mut self) {
        if !self.easy_segs.is_empty() {
            easy::reinsert(&self.core.crossings, &mut self.classes, &mut self.easy_segs);
        }
    }

    /// Sweep segments between classes until nothing has moved for
    /// [`SHUFFLE_ROUNDS`] consecutive sweeps.
    fn shuffle(&mut self) {
        let mut count = 0;
        while count < SHUFFLE_ROUNDS {
            let before = self.classes.len();
            self.shuffle_once();
            if self.classes.len() != before {
                debug!("shuffle dropped to {} colors", self.classes.len());
                count = 0;
            } else {
                count += 1;
            }
        }
    }

    fn shuffle_once(&mut self) {
        self.classes.sort_by_key(|class| class.len());
        let mut c = 0;
        while c < self.classes.len() {
            self.move_segments(c);
            if self.classes[c].is_empty() {
                self.classes.remove(c);
            } else {
                c += 1;
            }
        }
    }

    /// Move every segment of class `c` that fits somewhere else.
    ///
    /// Moves are collected first and applied afterwards; the segments of one
    /// class never cross each other, so the batch stays conflict-free.
    fn move_segments(&mut self, c: usize) {
        let mut moves: Vec<(SegIdx, usize)> = Vec::new();
        for &seg in &self.classes[c] {
            let target = (0..self.classes.len())
                .find(|&c2| c2 != c && admits(&self.core.crossings, &self.classes[c2], seg));
            if let Some(c2) = target {
                moves.push((seg, c2));
            }
        }
        for (seg, c2) in moves {
            remove_seg(&mut self.classes[c], seg);
            self.classes[c2].push(seg);
        }
    }

    /// Try to eliminate one class, smallest first.
    ///
    /// Returns as soon as a class has been removed; a failed attempt
    /// restores the saved coloring and moves on to the next class.
    fn eliminate(&mut self) -> Result<(), Exhausted> {
        self.classes.sort_by_key(|class| class.len());
        let mut c = 0;
        while c < self.classes.len() {
            self.move_segments(c);
            if self.classes[c].is_empty() {
                self.classes.remove(c);
                continue;
            }

            debug!(
                "conflict attempt on class {c} with {} segments",
                self.classes[c].len()
            );
            let saved = self.classes.clone();
            let mut queue: VecDeque<SegIdx> = self.classes.remove(c).into();
            let mut dfs_queue: VecDeque<SegIdx> = VecDeque::new();
            self.reset_queue_count();
            let mut blocked = false;

            while !(queue.is_empty() && dfs_queue.is_empty()) {
                if self.clock.expired() {
                    return Err(Exhausted);
                }
                self.maybe_switch_power();

                if let Some(s) = dfs_queue.pop_front() {
                    let depth = match queue.len() {
                        1 => 5,
                        2 => 7,
                        _ => 3,
                    };
                    if !(self.params.dfs && self.dfs_place(s, depth)) {
                        queue.push_back(s);
                    }
                    continue;
                }
                let Some(s) = queue.pop_front() else { break };

                match self.best_color(s) {
                    Some((best, conflicts)) => {
                        for &t in &conflicts {
                            remove_seg(&mut self.classes[best], t);
                            dfs_queue.push_back(t);
                        }
                        self.classes[best].push(s);
                        self.queue_count[s.0] = self.queue_count[s.0].saturating_add(1);
                    }
                    None => {
                        debug!(
                            "every class is pinned (max_queue = {}); restoring",
                            self.params.max_queue
                        );
                        self.classes = saved;
                        blocked = true;
                        break;
                    }
                }
            }

            if !blocked {
                info!("removed a color; {} remain", self.classes.len());
                return Ok(());
            }
            if self.clock.expired() {
                return Ok(());
            }
            c += 1;
        }
        Ok(())
    }

    fn reset_queue_count(&mut self) {
        self.queue_count.clear();
        self.queue_count.resize(self.core.len(), 0);
        for seg in &self.core.clique {
            self.queue_count[seg.0] = u64::MAX;
        }
    }

    fn maybe_switch_power(&mut self) {
        if self.params.loop_enabled
            && self.clock.elapsed() > (self.params.loop_time * (self.loop_index + 1)) as f64
        {
            self.loop_index += 1;
            self.power = POWER_LOOP[self.loop_index as usize % POWER_LOOP.len()];
            info!("loop mode: switching power to {}", self.power);
        }
    }

    /// The scored move: pick the cheapest class for a loose segment.
    ///
    /// The cost of a class sums `queue_count^power + 1` over its members
    /// crossing `seg`; any member at the `max_queue` cap disqualifies the
    /// class. The incumbent best is divided by a strictly positive gaussian
    /// sample before each comparison, which randomizes near-ties (and only
    /// near-ties: the stored best stays un-noised). Returns the chosen class
    /// and its conflicting members, or `None` when every class is
    /// disqualified.
    fn best_color(&mut self, seg: SegIdx) -> Option<(usize, Vec<SegIdx>)> {
        let limit = self.params.max_queue as f64 * self.core.len() as f64;
        let mut min_conflict = limit;
        let mut best = None;

        for (c, class) in self.classes.iter().enumerate() {
            let noise = loop {
                let x = self.noise.sample(&mut self.core.noise_rng);
                if x > 0.001 {
                    break x;
                }
            };
            let min_noised = min_conflict / noise;

            let mut cost = 0.0;
            let mut conflicts = Vec::new();
            for &t in class {
                if !self.core.crossings.crosses(seg, t) {
                    continue;
                }
                if self.queue_count[t.0] >= self.params.max_queue {
                    cost = min_noised + 1.0;
                    break;
                }
                cost += (self.queue_count[t.0] as f64).powf(self.power) + 1.0;
                if cost >= min_noised {
                    break;
                }
                conflicts.push(t);
            }

            if cost * noise < min_conflict {
                min_conflict = cost * noise;
                best = Some((c, conflicts));
            }
        }

        if min_conflict < limit {
            best
        } else {
            None
        }
    }

    fn dfs_place(&mut self, seg: SegIdx, depth: usize) -> bool {
        let mut events = Vec::new();
        let mut forbidden = Vec::new();
        self.dfs_optimize(&[seg], &mut forbidden, DFS_BREADTH, depth, &mut events)
    }

    /// Bounded DFS repair: place every `todo` segment, displacing at most
    /// `breadth` incumbents per trial class and recursively re-homing them.
    ///
    /// Displaced segments may not cross anything in `forbidden` (the
    /// segments placed higher up this branch). Every mutation is logged in
    /// `events`; a failed trial is undone back to its checkpoint, and a
    /// failed call undoes everything it logged, so failure leaves the
    /// coloring exactly as found. On success the events stay committed.
    fn dfs_optimize(
        &mut self,
        todo: &[SegIdx],
        forbidden: &mut Vec<SegIdx>,
        breadth: usize,
        depth: usize,
        events: &mut Vec<Event>,
    ) -> bool {
        if todo.is_empty() {
            return true;
        }
        let base = events.len();
        let breadth = if depth <= 1 { 0 } else { breadth };

        for &e in todo {
            let candidates = self.conflict_classes(e, breadth, forbidden);
            let mut placed = false;
            for (c, conflicts) in candidates {
                let mark = events.len();
                self.classes[c].push(e);
                events.push(Event::Added { class: c, seg: e });
                for &t in &conflicts {
                    remove_seg(&mut self.classes[c], t);
                    events.push(Event::Removed { class: c, seg: t });
                }

                forbidden.push(e);
                let ok =
                    self.dfs_optimize(&conflicts, forbidden, breadth, depth - 1, events);
                forbidden.pop();

                if ok {
                    placed = true;
                    break;
                }
                self.rollback(events, mark);
            }
            if !placed {
                self.rollback(events, base);
                return false;
            }
        }
        true
    }

    /// All classes where `e` has at most `breadth` conflicts, none of them
    /// forbidden, with those conflicts listed.
    fn conflict_classes(
        &self,
        e: SegIdx,
        breadth: usize,
        forbidden: &[SegIdx],
    ) -> Vec<(usize, Vec<SegIdx>)> {
        let mut out = Vec::new();
        'classes: for (c, class) in self.classes.iter().enumerate() {
            let mut hits = Vec::new();
            for &t in class {
                if self.core.crossings.crosses(e, t) {
                    if hits.len() == breadth || forbidden.contains(&t) {
                        continue 'classes;
                    }
                    hits.push(t);
                }
            }
            out.push((c, hits));
        }
        out
    }

    fn rollback(&mut self, events: &mut Vec<Event>, mark: usize) {
        for evt in events.drain(mark..).rev() {
            match evt {
                Event::Added { class, seg } => remove_seg(&mut self.classes[class], seg),
                Event::Removed { class, seg } => self.classes[class].push(seg),
            }
        }
    }
}
