//! Text items.
//!
//! Text is measured when constructed or edited, through the backend's
//! measurer, and the ink extents are cached on the item so that bounding
//! boxes never need a live draw context. Text is a label, not a shape:
//! it is never hit by point queries.

use crate::backend::{DrawContext, FontSpec, TextMeasurer};
use crate::error::CanvasError;
use crate::geometry::BBox;
use crate::item::{CanvasItem, ItemId, PixelExtents};
use crate::style::SerializableColor;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    id: ItemId,
    /// Baseline-left anchor in user coordinates.
    pub anchor: Point,
    text: String,
    font: FontSpec,
    /// Rotation about the anchor, in radians.
    pub angle: f64,
    pub color: SerializableColor,
    /// Ink extents relative to the anchor, in font-size units, y up.
    measured: Rect,
}

impl Text {
    pub fn new(anchor: Point, text: impl Into<String>, font: FontSpec, measurer: &dyn TextMeasurer) -> Self {
        let text = text.into();
        let measured = measurer.measure(&text, &font);
        Self {
            id: Uuid::new_v4(),
            anchor,
            text,
            font,
            angle: 0.0,
            color: SerializableColor::black(),
            measured,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    /// Replace the string and re-measure.
    pub fn set_text(&mut self, text: impl Into<String>, measurer: &dyn TextMeasurer) {
        self.text = text.into();
        self.measured = measurer.measure(&self.text, &self.font);
    }

    /// Replace the font and re-measure.
    pub fn set_font(&mut self, font: FontSpec, measurer: &dyn TextMeasurer) {
        self.font = font;
        self.measured = measurer.measure(&self.text, &self.font);
    }

    /// Rotated corners of the measured ink rect, relative to the anchor.
    fn hull_corners(&self) -> [Vec2; 4] {
        let r = self.measured;
        let c = self.angle.cos();
        let s = self.angle.sin();
        let rot = |x: f64, y: f64| Vec2::new(x * c - y * s, x * s + y * c);
        [
            rot(r.x0, r.y0),
            rot(r.x1, r.y0),
            rot(r.x1, r.y1),
            rot(r.x0, r.y1),
        ]
    }
}

impl CanvasItem for Text {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        if self.font.size_in_pixels {
            // All extent is pixel extent; the anchor is the only
            // scale-independent geometry.
            return BBox::from_point(self.anchor);
        }
        let mut bb = BBox::EMPTY;
        for corner in self.hull_corners() {
            bb.absorb_point(self.anchor + corner);
        }
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        if !self.font.size_in_pixels {
            return PixelExtents::ZERO;
        }
        let mut ext = PixelExtents::ZERO;
        for corner in self.hull_corners() {
            ext.left = ext.left.max(-corner.x);
            ext.right = ext.right.max(corner.x);
            ext.up = ext.up.max(corner.y);
            ext.down = ext.down.max(-corner.y);
        }
        ext
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.text.is_empty() {
            return Ok(());
        }
        let size_user = if self.font.size_in_pixels {
            self.font.size * ctx.user_per_pixel()
        } else {
            self.font.size
        };
        ctx.draw_text(
            self.anchor,
            &self.text,
            &self.font,
            size_user,
            self.angle,
            self.color.into(),
        );
        Ok(())
    }

    fn contains_point(&self, _pt: Point, _ppu: f64) -> bool {
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

    struct FixedMeasurer;

    impl TextMeasurer for FixedMeasurer {
        fn measure(&self, text: &str, font: &FontSpec) -> Rect {
            // 0.6em advance per char, 0.8em ascent, 0.2em descent.
            let w = 0.6 * font.size * text.chars().count() as f64;
            Rect::new(0.0, -0.2 * font.size, w, 0.8 * font.size)
        }
    }

    #[test]
    fn test_bare_bbox_user_font() {
        let font = FontSpec {
            size: 10.0,
            ..FontSpec::default()
        };
        let t = Text::new(Point::new(100.0, 50.0), "abcd", font, &FixedMeasurer);
        let bb = t.bare_bbox();
        assert!((bb.min().x - 100.0).abs() < 1e-9);
        assert!((bb.max().x - 124.0).abs() < 1e-9);
        assert!((bb.max().y - 58.0).abs() < 1e-9);
        assert!((bb.min().y - 48.0).abs() < 1e-9);
        assert!(t.pixel_extents().is_zero());
    }

    #[test]
    fn test_pixel_font_degenerates_to_anchor() {
        let font = FontSpec {
            size: 10.0,
            size_in_pixels: true,
            ..FontSpec::default()
        };
        let t = Text::new(Point::new(5.0, 5.0), "ab", font, &FixedMeasurer);
        assert!((t.bare_bbox().width()).abs() < f64::EPSILON);
        let ext = t.pixel_extents();
        assert!((ext.right - 12.0).abs() < 1e-9);
        assert!((ext.up - 8.0).abs() < 1e-9);
        assert!((ext.down - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_hull() {
        let font = FontSpec {
            size: 10.0,
            ..FontSpec::default()
        };
        let mut t = Text::new(Point::new(0.0, 0.0), "abcd", font, &FixedMeasurer);
        t.angle = std::f64::consts::FRAC_PI_2;
        let bb = t.bare_bbox();
        // The 24-unit advance now runs vertically.
        assert!((bb.max().y - 24.0).abs() < 1e-9);
        assert!((bb.min().x + 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_never_hit() {
        let t = Text::new(
            Point::new(0.0, 0.0),
            "hello",
            FontSpec::default(),
            &FixedMeasurer,
        );
        assert!(!t.contains_point(Point::new(1.0, 1.0), 1.0));
    }

    #[test]
    fn test_set_text_remeasures() {
        let font = FontSpec {
            size: 10.0,
            ..FontSpec::default()
        };
        let mut t = Text::new(Point::new(0.0, 0.0), "ab", font, &FixedMeasurer);
        let before = t.bare_bbox().width();
        t.set_text("abcdef", &FixedMeasurer);
        assert!(t.bare_bbox().width() > before);
    }
}
