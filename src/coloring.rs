//! Color classes and the coloring they form.

use crate::crossings::CrossingMap;
use crate::segments::SegIdx;

/// Can `seg` join `class` without crossing any of its members?
pub fn admits(map: &CrossingMap, class: &[SegIdx], seg: SegIdx) -> bool {
    class.iter().all(|&t| !map.crosses(seg, t))
}

/// A partition of segment indices into color classes.
///
/// The color of a segment is the position of its class. Classes are kept
/// crossing-free by every operation that inserts into them; empty classes
/// are dropped, so `num_colors` always equals the class count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coloring {
    n: usize,
    classes: Vec<Vec<SegIdx>>,
}

impl Coloring {
    /// An empty coloring over `n` segments.
    pub fn new(n: usize) -> Self {
        Coloring {
            n,
            classes: Vec::new(),
        }
    }

    /// Rebuild a coloring from per-segment labels, as read from a solution
    /// file. Labels must be dense `0..num_colors`.
    pub fn from_labels(labels: &[usize]) -> Self {
        let num_colors = labels.iter().map(|c| c + 1).max().unwrap_or(0);
        let mut classes = vec![Vec::new(); num_colors];
        for (i, &c) in labels.iter().enumerate() {
            classes[c].push(SegIdx(i));
        }
        classes.retain(|class| !class.is_empty());
        Coloring {
            n: labels.len(),
            classes,
        }
    }

    /// Assemble a coloring from raw classes.
    pub fn from_classes(n: usize, mut classes: Vec<Vec<SegIdx>>) -> Self {
        classes.retain(|class| !class.is_empty());
        Coloring { n, classes }
    }

    /// Tear the coloring down into its raw classes.
    pub fn into_classes(self) -> Vec<Vec<SegIdx>> {
        self.classes
    }

    /// The number of segments this coloring ranges over.
    pub fn num_segments(&self) -> usize {
        self.n
    }

    /// The number of colors in use.
    pub fn num_colors(&self) -> usize {
        self.classes.len()
    }

    /// The color classes.
    pub fn classes(&self) -> &[Vec<SegIdx>] {
        &self.classes
    }

    /// Assign `seg` the first color whose class admits it, appending a new
    /// class when none does. Returns the color used.
    pub fn assign_first_fit(&mut self, map: &CrossingMap, seg: SegIdx) -> usize {
        for (c, class) in self.classes.iter_mut().enumerate() {
            if admits(map, class, seg) {
                class.push(seg);
                return c;
            }
        }
        self.classes.push(vec![seg]);
        self.classes.len() - 1
    }

    /// Push `seg` into the class at `color`, extending the class list by one
    /// if `color` is the next fresh color.
    ///
    /// The caller vouches that the class admits `seg`.
    pub fn place(&mut self, color: usize, seg: SegIdx) {
        if color == self.classes.len() {
            self.classes.push(Vec::new());
        }
        self.classes[color].push(seg);
    }

    /// The derived color-of map: for each segment index, the position of its
    /// class, or `None` if it is currently unassigned.
    pub fn color_of(&self) -> Vec<Option<usize>> {
        let mut map = vec![None; self.n];
        for (c, class) in self.classes.iter().enumerate() {
            for &seg in class {
                map[seg.0] = Some(c);
            }
        }
        map
    }

    /// Dense per-segment labels, or `None` while any segment is unassigned.
    pub fn labels(&self) -> Option<Vec<usize>> {
        self.color_of().into_iter().collect()
    }

    /// Check every invariant: classes crossing-free, every segment colored
    /// exactly once, no empty classes.
    pub fn is_valid(&self, map: &CrossingMap) -> bool {
        let mut seen = vec![false; self.n];
        for class in &self.classes {
            if class.is_empty() {
                return false;
            }
            for (a, &i) in class.iter().enumerate() {
                if seen[i.0] {
                    return false;
                }
                seen[i.0] = true;
                if class[a + 1..].iter().any(|&j| map.crosses(i, j)) {
                    return false;
                }
            }
        }
        seen.into_iter().all(|s| s)
    }
}
