//! The item trait shared by everything that can be drawn on a layer.

use crate::backend::DrawContext;
use crate::error::CanvasError;
use crate::geometry::BBox;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// Unique identifier for canvas items.
pub type ItemId = Uuid;

/// Per-side margins in device pixels by which an item's footprint extends
/// past its bare bounding box. Pixel-sized decorations (dots, pixel-width
/// strokes, pixel-scaled text) report their size here instead of in the
/// bare box, so the bare box stays scale-independent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelExtents {
    pub left: f64,
    pub right: f64,
    pub up: f64,
    pub down: f64,
}

impl PixelExtents {
    pub const ZERO: PixelExtents = PixelExtents {
        left: 0.0,
        right: 0.0,
        up: 0.0,
        down: 0.0,
    };

    pub fn uniform(v: f64) -> Self {
        Self {
            left: v,
            right: v,
            up: v,
            down: v,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0 && self.up == 0.0 && self.down == 0.0
    }
}

/// A drawable, hit-testable scene item.
///
/// Geometry splits into two parts: the *bare* bounding box in user units,
/// and pixel extents that grow with 1/ppu. The full footprint at a given
/// scale is their combination, provided by [`CanvasItem::full_bbox`].
pub trait CanvasItem: std::fmt::Debug + Send + Sync {
    fn id(&self) -> ItemId;

    /// Bounding box of the scale-independent part of the item, in user
    /// units. May be a single point for items sized entirely in pixels.
    fn bare_bbox(&self) -> BBox;

    /// Device-pixel margins past the bare box. Zero for most items.
    fn pixel_extents(&self) -> PixelExtents {
        PixelExtents::ZERO
    }

    /// Draw through a context whose transform is already set. Paths are
    /// emitted in user coordinates. Degenerate geometry is skipped, not
    /// an error.
    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError>;

    /// Hit test in user coordinates at scale `ppu` (pixels per user
    /// unit). The scale matters because pixel-unit line widths and sizes
    /// change their user-space footprint with zoom.
    fn contains_point(&self, pt: Point, ppu: f64) -> bool;

    /// Full footprint at scale `ppu`: the bare box grown per side by the
    /// pixel extents converted to user units. As ppu grows the full box
    /// converges to the bare box.
    fn full_bbox(&self, ppu: f64) -> BBox {
        let ext = self.pixel_extents();
        let mut bb = self.bare_bbox();
        if !ext.is_zero() {
            bb.expand_sides(ext.left / ppu, ext.right / ppu, ext.up / ppu, ext.down / ppu);
        }
        bb
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_extents_uniform() {
        let ext = PixelExtents::uniform(3.0);
        assert!((ext.left - 3.0).abs() < f64::EPSILON);
        assert!((ext.down - 3.0).abs() < f64::EPSILON);
        assert!(!ext.is_zero());
        assert!(PixelExtents::ZERO.is_zero());
    }
}
