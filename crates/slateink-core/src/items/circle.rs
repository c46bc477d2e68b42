//! Circles, ellipses, and fixed-pixel dots.
//!
//! The perimeter of all three is drawn entirely *inside* the nominal
//! radius, not centered on it, so the nominal radius is the outer edge of
//! the shape. Hit tests use the same convention.

use crate::backend::DrawContext;
use crate::error::CanvasError;
use crate::geometry::BBox;
use crate::item::{CanvasItem, ItemId, PixelExtents};
use crate::style::ShapeStyle;
use kurbo::{Ellipse as KurboEllipse, Point, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// A circle with its radius in user units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    id: ItemId,
    pub center: Point,
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius,
            style: ShapeStyle::default(),
        }
    }
}

impl CanvasItem for Circle {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.center.x - self.radius, self.center.y - self.radius),
            Point::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.radius <= 0.0 {
            log::debug!("skipping degenerate circle with radius {}", self.radius);
            return Ok(());
        }
        let tol = 0.25 * ctx.user_per_pixel();
        if let Some(fill) = self.style.fill() {
            let path = kurbo::Circle::new(self.center, self.radius).to_path(tol);
            ctx.fill_path(&path, fill);
        }
        if self.style.lined() {
            // Stroke inside the nominal radius.
            let lw = self.style.line_width_user(ctx.user_per_pixel());
            let r = self.radius - 0.5 * lw;
            if r > 0.0 {
                let path = kurbo::Circle::new(self.center, r).to_path(tol);
                self.style.stroke_path(ctx, &path);
            }
        }
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let d2 = (pt - self.center).hypot2();
        if self.style.filled() {
            return d2 <= self.radius * self.radius;
        }
        if self.style.lined() {
            let lw = self.style.line_width_user(1.0 / ppu);
            let inner = (self.radius - lw).max(0.0);
            return d2 >= inner * inner && d2 <= self.radius * self.radius;
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

/// An ellipse with user-unit radii, rotated by `angle` radians about its
/// center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    id: ItemId,
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    #[serde(default)]
    pub angle: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    pub fn new(center: Point, radius_x: f64, radius_y: f64, angle: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius_x,
            radius_y,
            angle,
            style: ShapeStyle::default(),
        }
    }

    /// Coordinates of a point in the ellipse frame, normalized by the
    /// given radii: on the ellipse boundary the result has unit norm.
    fn normalized(&self, pt: Point, rx: f64, ry: f64) -> (f64, f64) {
        let p = pt - self.center;
        let c = self.angle.cos();
        let s = self.angle.sin();
        ((p.x * c + p.y * s) / rx, (-p.x * s + p.y * c) / ry)
    }
}

impl CanvasItem for Ellipse {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        // Closed-form extents of a rotated ellipse.
        let c = self.angle.cos();
        let s = self.angle.sin();
        let (r0, r1) = (self.radius_x, self.radius_y);
        let dx = (c * c * r0 * r0 + s * s * r1 * r1).sqrt();
        let dy = (c * c * r1 * r1 + s * s * r0 * r0).sqrt();
        BBox::new(
            Point::new(self.center.x - dx, self.center.y - dy),
            Point::new(self.center.x + dx, self.center.y + dy),
        )
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.radius_x <= 0.0 || self.radius_y <= 0.0 {
            log::debug!(
                "skipping degenerate ellipse with radii {} x {}",
                self.radius_x,
                self.radius_y
            );
            return Ok(());
        }
        let tol = 0.25 * ctx.user_per_pixel();
        if let Some(fill) = self.style.fill() {
            let path = KurboEllipse::new(self.center, (self.radius_x, self.radius_y), self.angle)
                .to_path(tol);
            ctx.fill_path(&path, fill);
        }
        if self.style.lined() {
            // Shrink both radii so the stroke's outer edge lands on the
            // nominal boundary.
            let lw = self.style.line_width_user(ctx.user_per_pixel());
            let rmax = self.radius_x.max(self.radius_y);
            let shrink = 1.0 - 0.5 * lw / rmax;
            if shrink > 0.0 {
                let path = KurboEllipse::new(
                    self.center,
                    (self.radius_x * shrink, self.radius_y * shrink),
                    self.angle,
                )
                .to_path(tol);
                self.style.stroke_path(ctx, &path);
            }
        }
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let (px, py) = self.normalized(pt, self.radius_x, self.radius_y);
        let outside = px * px + py * py > 1.0;
        if self.style.filled() {
            return !outside;
        }
        if self.style.lined() {
            if outside {
                return false;
            }
            let lw = self.style.line_width_user(1.0 / ppu);
            let rr0 = self.radius_x - lw;
            let rr1 = self.radius_y - lw;
            if rr0 <= 0.0 || rr1 <= 0.0 {
                return true;
            }
            let (qx, qy) = self.normalized(pt, rr0, rr1);
            return qx * qx + qy * qy >= 1.0;
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

/// A circular marker with a fixed size in device pixels. Its bare
/// bounding box is just its center; all of its size lives in the pixel
/// extents, so it never affects the user-space extent of the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dot {
    id: ItemId,
    pub center: Point,
    /// Radius in device pixels.
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Dot {
    pub fn new(center: Point, radius_px: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            center,
            radius: radius_px,
            style: ShapeStyle::default(),
        }
    }
}

impl CanvasItem for Dot {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        BBox::from_point(self.center)
    }

    fn pixel_extents(&self) -> PixelExtents {
        PixelExtents::uniform(self.radius)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        let upp = ctx.user_per_pixel();
        let r = self.radius * upp;
        if r <= 0.0 {
            log::debug!("skipping degenerate dot with radius {}px", self.radius);
            return Ok(());
        }
        let tol = 0.25 * upp;
        if let Some(fill) = self.style.fill() {
            let path = kurbo::Circle::new(self.center, r).to_path(tol);
            ctx.fill_path(&path, fill);
        }
        if self.style.lined() {
            let lw = self.style.line_width_user(upp);
            let rs = r - 0.5 * lw;
            if rs > 0.0 {
                let path = kurbo::Circle::new(self.center, rs).to_path(tol);
                self.style.stroke_path(ctx, &path);
            }
        }
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let d2 = (pt - self.center).hypot2();
        let r = self.radius / ppu;
        if self.style.filled() {
            return d2 <= r * r;
        }
        if self.style.lined() {
            let lw = self.style.line_width_user(1.0 / ppu);
            let inner = (r - lw).max(0.0);
            return d2 >= inner * inner && d2 <= r * r;
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
    fn test_circle_bare_bbox() {
        let c = Circle::new(Point::new(10.0, 20.0), 5.0);
        let bb = c.bare_bbox();
        assert!((bb.min().x - 5.0).abs() < f64::EPSILON);
        assert!((bb.max().y - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_hit_filled_vs_lined() {
        let mut c = Circle::new(Point::new(0.0, 0.0), 10.0);
        c.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        c.style.set_line(None);
        assert!(c.contains_point(Point::new(0.0, 0.0), 1.0));
        assert!(c.contains_point(Point::new(10.0, 0.0), 1.0));
        assert!(!c.contains_point(Point::new(10.5, 0.0), 1.0));

        let mut o = Circle::new(Point::new(0.0, 0.0), 10.0);
        o.style.set_line_width(2.0);
        // Perimeter only: the band is [radius - lw, radius].
        assert!(!o.contains_point(Point::new(0.0, 0.0), 1.0));
        assert!(o.contains_point(Point::new(9.0, 0.0), 1.0));
        assert!(o.contains_point(Point::new(8.0, 0.0), 1.0));
        assert!(!o.contains_point(Point::new(7.9, 0.0), 1.0));
    }

    #[test]
    fn test_circle_pixel_width_hit_depends_on_scale() {
        let mut c = Circle::new(Point::new(0.0, 0.0), 10.0);
        c.style.set_line_width_in_pixels(4.0);
        // At ppu 1 the band is 4 user units wide; at ppu 8 only 0.5.
        assert!(c.contains_point(Point::new(6.5, 0.0), 1.0));
        assert!(!c.contains_point(Point::new(6.5, 0.0), 8.0));
        assert!(c.contains_point(Point::new(9.75, 0.0), 8.0));
    }

    #[test]
    fn test_ellipse_rotated_bbox() {
        // At 90 degrees the radii swap roles.
        let e = Ellipse::new(Point::new(0.0, 0.0), 4.0, 1.0, std::f64::consts::FRAC_PI_2);
        let bb = e.bare_bbox();
        assert!((bb.width() - 2.0).abs() < 1e-9);
        assert!((bb.height() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_ellipse_hit_rotated() {
        let mut e = Ellipse::new(Point::new(0.0, 0.0), 4.0, 1.0, std::f64::consts::FRAC_PI_2);
        e.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        assert!(e.contains_point(Point::new(0.0, 3.9), 1.0));
        assert!(!e.contains_point(Point::new(3.9, 0.0), 1.0));
    }

    #[test]
    fn test_dot_full_bbox_shrinks_with_zoom() {
        let d = Dot::new(Point::new(5.0, 5.0), 3.0);
        let at1 = d.full_bbox(1.0);
        let at10 = d.full_bbox(10.0);
        assert!((at1.width() - 6.0).abs() < f64::EPSILON);
        assert!((at10.width() - 0.6).abs() < f64::EPSILON);
        assert!((d.bare_bbox().width()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dot_hit_scales() {
        let mut d = Dot::new(Point::new(0.0, 0.0), 4.0);
        d.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        assert!(d.contains_point(Point::new(3.0, 0.0), 1.0));
        assert!(!d.contains_point(Point::new(3.0, 0.0), 2.0));
        assert!(d.contains_point(Point::new(1.9, 0.0), 2.0));
    }
}
