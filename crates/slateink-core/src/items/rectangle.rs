//! Axis-aligned rectangles.

use crate::backend::DrawContext;
use crate::error::CanvasError;
use crate::geometry::BBox;
use crate::item::{CanvasItem, ItemId, PixelExtents};
use crate::items::stroke_margins;
use crate::style::ShapeStyle;
use kurbo::{Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// An axis-aligned rectangle spanning two corner points. The stroke is
/// centered on the perimeter, so half the line width extends past the
/// corners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    id: ItemId,
    pub corner0: Point,
    pub corner1: Point,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(corner0: Point, corner1: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            corner0,
            corner1,
            style: ShapeStyle::default(),
        }
    }

    fn rect(&self) -> Rect {
        Rect::from_points(self.corner0, self.corner1)
    }
}

impl CanvasItem for Rectangle {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let mut bb = BBox::new(self.corner0, self.corner1);
        let (user, _) = stroke_margins(&self.style);
        bb.expand(user, user);
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        let (_, px) = stroke_margins(&self.style);
        PixelExtents::uniform(px)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        let rect = self.rect();
        if rect.width() <= 0.0 && rect.height() <= 0.0 {
            log::debug!("skipping degenerate rectangle at {:?}", self.corner0);
            return Ok(());
        }
        let path = rect.to_path(0.0);
        self.style.fill_and_stroke(ctx, &path);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let rect = self.rect();
        if self.style.filled() {
            let mut bb = BBox::new(self.corner0, self.corner1);
            let half = 0.5 * self.style.line_width_user(1.0 / ppu);
            bb.expand(half, half);
            return bb.contains(pt);
        }
        if self.style.lined() {
            // Within half a line width of the perimeter: inside the
            // expanded box but not inside the shrunk one.
            let half = 0.5 * self.style.line_width_user(1.0 / ppu);
            let mut outer = BBox::new(self.corner0, self.corner1);
            outer.expand(half, half);
            if !outer.contains(pt) {
                return false;
            }
            let inner = Rect::new(
                rect.x0 + half,
                rect.y0 + half,
                rect.x1 - half,
                rect.y1 - half,
            );
            if inner.width() <= 0.0 || inner.height() <= 0.0 {
                return true;
            }
            return !(pt.x > inner.x0 && pt.x < inner.x1 && pt.y > inner.y0 && pt.y < inner.y1);
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

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::Color;

    #[test]
    fn test_bare_bbox_includes_stroke() {
        let mut r = Rectangle::new(Point::new(0.0, 0.0), Point::new(10.0, 4.0));
        r.style.set_line_width(2.0);
        let bb = r.bare_bbox();
        assert!((bb.min().x + 1.0).abs() < f64::EPSILON);
        assert!((bb.max().x - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pixel_width_moves_margin_to_extents() {
        let mut r = Rectangle::new(Point::new(0.0, 0.0), Point::new(10.0, 4.0));
        r.style.set_line_width_in_pixels(2.0);
        let bb = r.bare_bbox();
        assert!((bb.min().x).abs() < f64::EPSILON);
        let ext = r.pixel_extents();
        assert!((ext.left - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_filled() {
        let mut r = Rectangle::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        r.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        r.style.set_line(None);
        assert!(r.contains_point(Point::new(5.0, 5.0), 1.0));
        assert!(!r.contains_point(Point::new(11.0, 5.0), 1.0));
    }

    #[test]
    fn test_hit_perimeter_band() {
        let mut r = Rectangle::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        r.style.set_line_width(2.0);
        assert!(r.contains_point(Point::new(0.5, 5.0), 1.0));
        assert!(r.contains_point(Point::new(-0.5, 5.0), 1.0));
        assert!(!r.contains_point(Point::new(5.0, 5.0), 1.0));
        assert!(!r.contains_point(Point::new(-1.5, 5.0), 1.0));
    }
}
