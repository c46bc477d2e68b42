//! Bitmap image items.

use crate::backend::{DrawContext, ImageData};
use crate::error::CanvasError;
use crate::geometry::BBox;
use crate::item::{CanvasItem, ItemId, PixelExtents};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// An RGBA8 image anchored at its lower-left corner.
///
/// The display size is in user units by default. Components that are
/// unset (or set non-positive) are inferred from the pixel aspect ratio;
/// with neither set the image displays at one user unit per pixel. In
/// pixel-scaling mode the image keeps a fixed on-screen size instead and
/// its bare box degenerates to the anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    id: ItemId,
    /// Lower-left corner in user coordinates.
    pub position: Point,
    data: ImageData,
    size: Size,
    size_in_pixels: bool,
    pub opacity: f64,
}

impl Image {
    pub fn new(position: Point, data: ImageData) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            data,
            size: Size::ZERO,
            size_in_pixels: false,
            opacity: 1.0,
        }
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ImageData {
        &mut self.data
    }

    /// Set the display size in user units. Non-positive components are
    /// inferred from the image's aspect ratio.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
        self.size_in_pixels = false;
    }

    /// Display at a fixed size in device pixels, unaffected by zoom.
    /// Non-positive components are inferred as for `set_size`.
    pub fn set_size_in_pixels(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
        self.size_in_pixels = true;
    }

    /// Display size with unset components resolved from the pixel aspect.
    fn resolved_size(&self) -> Size {
        let dw = self.data.width() as f64;
        let dh = self.data.height() as f64;
        let (w, h) = (self.size.width, self.size.height);
        if w > 0.0 && h > 0.0 {
            Size::new(w, h)
        } else if w > 0.0 {
            Size::new(w, if dw > 0.0 { w * dh / dw } else { 0.0 })
        } else if h > 0.0 {
            Size::new(if dh > 0.0 { h * dw / dh } else { 0.0 }, h)
        } else {
            Size::new(dw, dh)
        }
    }
}

impl CanvasItem for Image {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        if self.size_in_pixels {
            return BBox::from_point(self.position);
        }
        let size = self.resolved_size();
        BBox::new(
            self.position,
            Point::new(self.position.x + size.width, self.position.y + size.height),
        )
    }

    fn pixel_extents(&self) -> PixelExtents {
        if !self.size_in_pixels {
            return PixelExtents::ZERO;
        }
        let size = self.resolved_size();
        PixelExtents {
            left: 0.0,
            right: size.width,
            up: size.height,
            down: 0.0,
        }
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.data.width() == 0 || self.data.height() == 0 {
            log::debug!("skipping empty image at {:?}", self.position);
            return Ok(());
        }
        let mut size = self.resolved_size();
        if self.size_in_pixels {
            let upp = ctx.user_per_pixel();
            size = Size::new(size.width * upp, size.height * upp);
        }
        let dest = Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + size.width,
            self.position.y + size.height,
        );
        ctx.draw_image(&self.data, dest, self.opacity);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        self.full_bbox(ppu).contains(pt)
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

    fn image_4x2() -> Image {
        Image::new(Point::new(0.0, 0.0), ImageData::new(4, 2))
    }

    #[test]
    fn test_default_size_is_one_unit_per_pixel() {
        let img = image_4x2();
        let bb = img.bare_bbox();
        assert!((bb.width() - 4.0).abs() < f64::EPSILON);
        assert!((bb.height() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aspect_inference() {
        let mut img = image_4x2();
        img.set_size(8.0, 0.0);
        let bb = img.bare_bbox();
        assert!((bb.width() - 8.0).abs() < f64::EPSILON);
        assert!((bb.height() - 4.0).abs() < f64::EPSILON);

        img.set_size(0.0, 1.0);
        let bb = img.bare_bbox();
        assert!((bb.width() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pixel_scaling_moves_size_to_extents() {
        let mut img = image_4x2();
        img.set_size_in_pixels(40.0, 20.0);
        assert!((img.bare_bbox().width()).abs() < f64::EPSILON);
        let ext = img.pixel_extents();
        assert!((ext.right - 40.0).abs() < f64::EPSILON);
        assert!((ext.up - 20.0).abs() < f64::EPSILON);
        assert!((ext.left).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_is_bbox() {
        let img = image_4x2();
        assert!(img.contains_point(Point::new(2.0, 1.0), 1.0));
        assert!(!img.contains_point(Point::new(5.0, 1.0), 1.0));
    }
}
