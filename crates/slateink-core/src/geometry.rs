//! Geometric primitives: bounding boxes, device coordinates, segments.
//!
//! Items live in user coordinates (y up); rendered output is in device
//! coordinates (integer pixels, y down). `BBox` is the user-space
//! axis-aligned box used throughout the scene graph; unlike `kurbo::Rect`
//! it has an explicit empty state so that unions over zero items work.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in user coordinates, possibly empty.
///
/// The empty box absorbs nothing and is contained in everything is *not*
/// true: the empty box contains no points and unions as the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    min: Point,
    max: Point,
}

impl BBox {
    /// The empty box. Absorbing into it yields the other operand.
    pub const EMPTY: BBox = BBox {
        min: Point::new(f64::INFINITY, f64::INFINITY),
        max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// Box spanning two corner points, given in any order.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            min: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            max: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Degenerate box containing a single point.
    pub fn from_point(p: Point) -> Self {
        Self { min: p, max: p }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.x - self.min.x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max.y - self.min.y
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
        )
    }

    /// Grow to include another box.
    pub fn absorb(&mut self, other: &BBox) {
        if other.is_empty() {
            return;
        }
        self.absorb_point(other.min);
        self.absorb_point(other.max);
    }

    /// Grow to include a point.
    pub fn absorb_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Grow symmetrically by `dx` horizontally and `dy` vertically on each
    /// side. A no-op on the empty box.
    pub fn expand(&mut self, dx: f64, dy: f64) {
        if self.is_empty() {
            return;
        }
        self.min.x -= dx;
        self.min.y -= dy;
        self.max.x += dx;
        self.max.y += dy;
    }

    /// Grow each side independently. Used to add per-side pixel extents
    /// converted to user units.
    pub fn expand_sides(&mut self, left: f64, right: f64, up: f64, down: f64) {
        if self.is_empty() {
            return;
        }
        self.min.x -= left;
        self.max.x += right;
        self.max.y += up;
        self.min.y -= down;
    }

    pub fn shift(&mut self, by: Vec2) {
        if self.is_empty() {
            return;
        }
        self.min += by;
        self.max += by;
    }

    /// Scale about the origin. Negative factors flip the box, so the
    /// corners are re-sorted afterwards.
    pub fn scale(&mut self, fx: f64, fy: f64) {
        if self.is_empty() {
            return;
        }
        *self = BBox::new(
            Point::new(self.min.x * fx, self.min.y * fy),
            Point::new(self.max.x * fx, self.max.y * fy),
        );
    }

    /// Inclusive containment test. Always false for the empty box.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// An integer pixel coordinate in device space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A bitmap size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A directed line segment in user coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seg {
    pub p0: Point,
    pub p1: Point,
}

impl Seg {
    pub fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }

    /// Angle of the segment direction, in radians.
    pub fn angle(&self) -> f64 {
        let d = self.p1 - self.p0;
        d.y.atan2(d.x)
    }

    /// Point at fractional position `alpha` along the segment.
    pub fn interpolate(&self, alpha: f64) -> Point {
        self.p0 + (self.p1 - self.p0) * alpha
    }

    /// Project a point onto the segment's line.
    ///
    /// Returns `(alpha, distance²)` where `alpha` is the fractional
    /// position of the projection along the segment (0 at `p0`, 1 at
    /// `p1`, possibly outside that range) and `distance²` is the squared
    /// perpendicular distance. For a zero-length segment `alpha` is 0 and
    /// the distance is measured to `p0`.
    pub fn projection(&self, pt: Point) -> (f64, f64) {
        let d = self.p1 - self.p0;
        let v = pt - self.p0;
        let len2 = d.hypot2();
        if len2 < f64::EPSILON {
            return (0.0, v.hypot2());
        }
        let alpha = v.dot(d) / len2;
        let foot = self.p0 + d * alpha;
        (alpha, (pt - foot).hypot2())
    }
}

/// Winding number of a closed polygon around a point.
///
/// Signed crossing count: nonzero means the point is inside under the
/// nonzero fill rule. The polygon is implicitly closed from the last
/// vertex back to the first.
pub fn winding_number(pt: Point, corners: &[Point]) -> i32 {
    let n = corners.len();
    if n < 3 {
        return 0;
    }
    // >0 when r is left of the directed line p->q
    let is_left =
        |p: Point, q: Point, r: Point| (q.x - p.x) * (r.y - p.y) - (r.x - p.x) * (q.y - p.y);
    let mut wn = 0;
    for i in 0..n {
        let a = corners[i];
        let b = corners[(i + 1) % n];
        if a.y <= pt.y {
            if b.y > pt.y && is_left(a, b, pt) > 0.0 {
                wn += 1;
            }
        } else if b.y <= pt.y && is_left(a, b, pt) < 0.0 {
            wn -= 1;
        }
    }
    wn
}
