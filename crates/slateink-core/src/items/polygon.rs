//! Closed polygons with winding-number hit testing, and open polylines.

use crate::backend::DrawContext;
use crate::error::CanvasError;
use crate::geometry::{winding_number, BBox, Seg};
use crate::item::{CanvasItem, ItemId, PixelExtents};
use crate::items::stroke_margins;
use crate::style::ShapeStyle;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// A closed polygon. The last corner connects back to the first; corners
/// may describe a concave or self-intersecting outline, in which case the
/// fill and the hit test both follow the nonzero winding rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    id: ItemId,
    pub corners: Vec<Point>,
    pub style: ShapeStyle,
}

impl Polygon {
    pub fn new(corners: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            corners,
            style: ShapeStyle::default(),
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.corners.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            path.close_path();
        }
        path
    }

    /// True when the point is within half a line width of any edge,
    /// including the closing edge.
    fn near_perimeter(&self, pt: Point, lw: f64) -> bool {
        let n = self.corners.len();
        let r2 = 0.25 * lw * lw;
        for i in 0..n {
            let seg = Seg::new(self.corners[i], self.corners[(i + 1) % n]);
            let (alpha, d2) = seg.projection(pt);
            if (0.0..=1.0).contains(&alpha) && d2 < r2 {
                return true;
            }
        }
        false
    }
}

impl CanvasItem for Polygon {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let mut bb = BBox::EMPTY;
        for p in &self.corners {
            bb.absorb_point(*p);
        }
        let (user, _) = stroke_margins(&self.style);
        bb.expand(user, user);
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        let (_, px) = stroke_margins(&self.style);
        PixelExtents::uniform(px)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.corners.len() < 2 {
            log::debug!("skipping polygon with {} corners", self.corners.len());
            return Ok(());
        }
        let path = self.to_path();
        self.style.fill_and_stroke(ctx, &path);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        if self.corners.len() < 3 {
            return false;
        }
        if self.style.filled() && winding_number(pt, &self.corners) != 0 {
            return true;
        }
        if self.style.lined() {
            let lw = self.style.line_width_user(1.0 / ppu);
            return self.near_perimeter(pt, lw);
        }
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An open polyline through a sequence of points. Unlike [`Polygon`] it
/// is never closed or filled; only the stroke is drawn and hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    id: ItemId,
    pub points: Vec<Point>,
    pub style: ShapeStyle,
}

impl Curve {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            style: ShapeStyle::default(),
        }
    }

    pub fn add_point(&mut self, p: Point) {
        self.points.push(p);
    }
}

impl CanvasItem for Curve {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let mut bb = BBox::EMPTY;
        for p in &self.points {
            bb.absorb_point(*p);
        }
        let (user, _) = stroke_margins(&self.style);
        bb.expand(user, user);
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        let (_, px) = stroke_margins(&self.style);
        PixelExtents::uniform(px)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.points.len() < 2 {
            log::debug!("skipping curve with {} points", self.points.len());
            return Ok(());
        }
        let mut path = BezPath::new();
        path.move_to(self.points[0]);
        for p in &self.points[1..] {
            path.line_to(*p);
        }
        self.style.stroke_path(ctx, &path);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let lw = self.style.line_width_user(1.0 / ppu);
        let r2 = 0.25 * lw * lw;
        self.points.windows(2).any(|pair| {
            let (alpha, d2) = Seg::new(pair[0], pair[1]).projection(pt);
            (0.0..=1.0).contains(&alpha) && d2 < r2
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::Color;

    fn l_shape() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 4.0),
            Point::new(0.0, 4.0),
        ]
    }

    #[test]
    fn test_hit_concave_fill() {
        let mut poly = Polygon::new(l_shape());
        poly.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        poly.style.set_line(None);
        assert!(poly.contains_point(Point::new(1.0, 1.0), 1.0));
        assert!(poly.contains_point(Point::new(1.0, 3.0), 1.0));
        // the notch is outside
        assert!(!poly.contains_point(Point::new(3.0, 3.0), 1.0));
    }

    #[test]
    fn test_hit_perimeter_includes_closing_edge() {
        let mut poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        poly.style.set_line_width(1.0);
        // Closing edge runs from (10,10) back to (0,0).
        assert!(poly.contains_point(Point::new(5.0, 5.0), 1.0));
        assert!(!poly.contains_point(Point::new(5.0, 6.0), 1.0));
    }

    #[test]
    fn test_bare_bbox_spans_corners() {
        let mut poly = Polygon::new(l_shape());
        poly.style.set_line(None);
        let bb = poly.bare_bbox();
        assert!((bb.width() - 4.0).abs() < f64::EPSILON);
        assert!((bb.height() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_polygon_never_hit() {
        let poly = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(!poly.contains_point(Point::new(0.5, 0.5), 1.0));
    }

    #[test]
    fn test_curve_open_no_closing_edge() {
        let mut curve = Curve::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        curve.style.set_line_width(1.0);
        assert!(curve.contains_point(Point::new(5.0, 0.2), 1.0));
        // The segment back to the start does not exist.
        assert!(!curve.contains_point(Point::new(5.0, 5.0), 1.0));
    }

    #[test]
    fn test_curve_bbox_includes_stroke_margin() {
        let mut curve = Curve::new(vec![Point::new(0.0, 0.0), Point::new(4.0, 2.0)]);
        curve.style.set_line_width(2.0);
        let bb = curve.bare_bbox();
        assert!((bb.min().x + 1.0).abs() < f64::EPSILON);
        assert!((bb.max().y - 3.0).abs() < f64::EPSILON);
    }
}
