#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod coloring;
pub mod conflict;
pub mod crossings;
pub mod easy;
mod geom;
pub mod heuristics;
pub mod instance;
pub mod params;
mod segments;
pub mod solution;

pub use coloring::Coloring;
pub use crossings::CrossingMap;
pub use geom::{convex_hull, orient, poly_area2, Point, Segment};
pub use segments::{SegIdx, Segments};

/// Something went wrong with an instance, a solution, or their files.
#[derive(Debug)]
pub enum Error {
    /// A file could not be read or written.
    Io(std::io::Error),
    /// A file was not valid JSON.
    Json(serde_json::Error),
    /// The JSON was parseable but not a valid instance/solution/parameter
    /// document.
    Malformed(String),
    /// The chosen heuristic needs segment geometry, but the instance only
    /// carries an adjacency list.
    NoGeometry(&'static str),
    /// A solution was asked for while some segment was still uncolored.
    Incomplete,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "i/o error: {e}"),
            Error::Json(e) => write!(f, "invalid JSON: {e}"),
            Error::Malformed(msg) => write!(f, "malformed document: {msg}"),
            Error::NoGeometry(what) => {
                write!(f, "{what} needs segment geometry, but the instance has none")
            }
            Error::Incomplete => write!(f, "the coloring does not cover every segment"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// The state every coloring algorithm works over.
///
/// This bundles the (immutable) intersection model with the mutable bits the
/// heuristics share: the two random streams and the optional clique side
/// information. Heuristics and the optimizer borrow a `Core` rather than
/// inheriting from an instance type, so they compose freely and tests can
/// seed them deterministically.
#[derive(Debug)]
pub struct Core {
    /// Segment geometry; `None` when the instance is an adjacency list.
    pub segments: Option<Segments>,
    /// The precomputed crossing matrix.
    pub crossings: CrossingMap,
    /// Segments known to be pairwise crossing; a lower bound on the color
    /// count, and never displaced by the conflict optimizer.
    pub clique: Vec<SegIdx>,
    /// Integer stream: random rotations and tie-breaks.
    pub rng: StdRng,
    /// Float stream: gaussian noise in the scored move.
    pub noise_rng: StdRng,
}

impl Core {
    /// Create a core with entropy-seeded random streams.
    pub fn new(segments: Option<Segments>, crossings: CrossingMap) -> Self {
        Core {
            segments,
            crossings,
            clique: Vec::new(),
            rng: StdRng::from_entropy(),
            noise_rng: StdRng::from_entropy(),
        }
    }

    /// Create a core with both random streams derived from `seed`.
    ///
    /// The streams stay independent of each other; reusing the seed
    /// reproduces a run exactly.
    pub fn seeded(segments: Option<Segments>, crossings: CrossingMap, seed: u64) -> Self {
        Core {
            segments,
            crossings,
            clique: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            noise_rng: StdRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    /// Attach clique side information.
    pub fn with_clique(mut self, clique: Vec<SegIdx>) -> Self {
        self.clique = clique;
        self
    }

    /// The number of segments.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.crossings.len()
    }
}

/// A wall-clock budget, polled at the entry of every major iteration.
///
/// Time is measured from instance load, matching the `elapsed_time` field of
/// the solution meta block.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: std::time::Instant,
    budget: std::time::Duration,
}

impl Clock {
    /// Start a clock with a budget of `secs` seconds.
    pub fn new(secs: u64) -> Self {
        Clock {
            start: std::time::Instant::now(),
            budget: std::time::Duration::from_secs(secs),
        }
    }

    /// Seconds elapsed since the clock started.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Has the budget run out?
    pub fn expired(&self) -> bool {
        self.start.elapsed() > self.budget
    }
}
