//! Geometric primitives, like points and segments.
//!
//! Everything here is exact: coordinates are `i64` and all predicates are
//! evaluated in integer arithmetic. Coordinates are assumed to fit in 31
//! bits, so that the products inside [`orient`] fit in 62.

/// A two-dimensional point with integer coordinates.
///
/// Points are sorted by `x` and then by `y`; segment endpoints are
/// canonicalized with this order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: i64,
    /// Vertical coordinate.
    pub y: i64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i64, i64)> for Point {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: i64, y: i64) -> Self {
        Point { x, y }
    }

    /// Squared euclidean distance to `other`.
    pub fn l2sq(&self, other: &Self) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Is this point inside the closed bounding box spanned by `p` and `q`?
    ///
    /// This is a box test only; combined with a collinearity check it decides
    /// whether a point lies on a segment.
    pub fn in_box(&self, p: &Point, q: &Point) -> bool {
        let (min_x, max_x) = (p.x.min(q.x), p.x.max(q.x));
        let (min_y, max_y) = (p.y.min(q.y), p.y.max(q.y));
        (min_x..=max_x).contains(&self.x) && (min_y..=max_y).contains(&self.y)
    }
}

/// The orientation of the point triple `(p, q, r)`.
///
/// Returns `+1` if the triple turns counterclockwise, `-1` if it turns
/// clockwise, and `0` if the three points are collinear.
pub fn orient(p: &Point, q: &Point, r: &Point) -> i32 {
    let val = (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
    match val.cmp(&0) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// A straight line segment between two integer points.
///
/// The endpoints are canonicalized at construction so that `p <= q` in
/// lexicographic order; two segments with the same endpoint set always
/// compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    p: Point,
    q: Point,
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} -- {:?}", self.p, self.q)
    }
}

impl Segment {
    /// Create a new segment; the endpoints may be given in either order.
    pub fn new(p: Point, q: Point) -> Self {
        if p <= q {
            Segment { p, q }
        } else {
            Segment { p: q, q: p }
        }
    }

    /// The lexicographically smaller endpoint.
    pub fn p(&self) -> &Point {
        &self.p
    }

    /// The lexicographically larger endpoint.
    pub fn q(&self) -> &Point {
        &self.q
    }

    /// The slope of this segment, as a float.
    ///
    /// Vertical segments return infinity. Slopes are only ever *compared*
    /// (for the angle-ordered heuristics); no arithmetic is done on them.
    pub fn slope(&self) -> f64 {
        (self.q.y - self.p.y) as f64 / (self.q.x - self.p.x) as f64
    }

    /// Orientation of `r` relative to the directed line `p -> q`.
    pub fn orient(&self, r: &Point) -> i32 {
        orient(&self.p, &self.q, r)
    }

    /// Do `self` and `other` cross?
    ///
    /// Two segments cross when they share at least one point that is not
    /// merely a common endpoint: a proper interior intersection, a collinear
    /// overlap, or an endpoint of one lying on the other. Sharing an endpoint
    /// alone does not count, and a segment never crosses a copy of itself.
    /// The predicate is symmetric.
    pub fn crosses(&self, other: &Segment) -> bool {
        let o1 = self.orient(&other.p);
        let o2 = self.orient(&other.q);
        let o3 = other.orient(&self.p);
        let o4 = other.orient(&self.q);

        // General position: a proper crossing iff the endpoints of each
        // segment straddle the other's line.
        if o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
            return o1 != o2 && o3 != o4;
        }

        // Some triple is collinear, but no endpoint is shared.
        if other.p != self.p && other.q != self.q && other.p != self.q && other.q != self.p {
            return other.p.in_box(&self.p, &self.q)
                || other.q.in_box(&self.p, &self.q)
                || self.p.in_box(&other.p, &other.q)
                || self.q.in_box(&other.p, &other.q);
        }

        if self == other {
            return false;
        }

        // A shared endpoint with the remaining points off-line: the segments
        // touch at the shared endpoint only.
        if o1 != 0 || o2 != 0 || o3 != 0 || o4 != 0 {
            return false;
        }

        // A shared endpoint with everything collinear: they cross iff one
        // extends into the other.
        if other.p == self.p {
            return self.q.in_box(&other.p, &other.q) || other.q.in_box(&self.p, &self.q);
        }
        if other.q == self.q {
            return self.p.in_box(&other.p, &other.q) || other.p.in_box(&self.p, &self.q);
        }
        if other.p == self.q {
            return self.p.in_box(&other.p, &other.q) || other.q.in_box(&self.p, &self.q);
        }
        // other.q == self.p
        self.q.in_box(&other.p, &other.q) || other.p.in_box(&self.p, &self.q)
    }
}

/// The convex hull of `points`, in counterclockwise order.
///
/// Graham scan: angular sort around an extreme point (ties broken by
/// euclidean distance), then a monotone stack. Collections of at most two
/// points are returned unchanged. Duplicate input points are harmless.
pub fn convex_hull(mut points: Vec<Point>) -> Vec<Point> {
    if points.len() <= 2 {
        return points;
    }

    let pivot = *points.iter().min().unwrap();
    points.retain(|p| *p != pivot);
    if points.is_empty() {
        return vec![pivot];
    }
    points.sort_by(|a, b| match orient(&pivot, a, b) {
        1 => std::cmp::Ordering::Less,
        -1 => std::cmp::Ordering::Greater,
        _ => pivot.l2sq(a).cmp(&pivot.l2sq(b)),
    });

    let mut hull = vec![pivot];
    for p in points {
        while hull.len() >= 2 && orient(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}

/// Twice the signed area of the polygon `poly`.
///
/// Nonnegative for counterclockwise polygons, so the hulls produced by
/// [`convex_hull`] always yield nonnegative areas. Staying at twice the area
/// keeps everything in integers.
pub fn poly_area2(poly: &[Point]) -> i64 {
    if poly.len() < 3 {
        return 0;
    }
    let mut a = 0;
    for i in 0..poly.len() {
        let p = &poly[i];
        let q = &poly[(i + 1) % poly.len()];
        a += p.x * q.y - q.x * p.y;
    }
    a
}
