//! Off-screen export of canvas content.
//!
//! Export renders at its own scale, chosen so the longer side of the
//! requested region comes out at a given pixel count, independent of the
//! on-screen transform. Layers are rendered one at a time into a reused
//! scratch surface and composited with their opacities, exactly as in
//! on-screen drawing, so exported output matches the display.

use crate::backend::{check_surface_size, Backend, Surface};
use crate::canvas::Canvas;
use crate::error::CanvasError;
use crate::geometry::{BBox, PixelSize};
use kurbo::{Affine, Point, Vec2};
use std::path::Path;

impl<B: Backend> Canvas<B> {
    /// Render the user-space rectangle `region` into a fresh surface
    /// whose longer side is `maxpix` pixels. With `background` set the
    /// canvas background is painted first; otherwise unpainted areas
    /// stay transparent.
    pub fn save_region(
        &self,
        region: &BBox,
        maxpix: u32,
        background: bool,
    ) -> Result<B::Surface, CanvasError> {
        if self.n_visible_items() == 0 {
            return Err(CanvasError::NothingToExport);
        }
        let w = region.width();
        let h = region.height();
        let ppu = maxpix as f64 / w.max(h);
        let size = PixelSize::new(
            ((ppu * w).ceil() as u32).max(1),
            ((ppu * h).ceil() as u32).max(1),
        );
        check_surface_size(self.backend(), size)?;

        let mut output = self.backend().new_surface(size, self.antialias())?;
        if background {
            output.fill(self.background());
        }

        // The centering transform can leave a sub-pixel gap on the right
        // and bottom because the sizes were rounded up. Shift so the
        // region's upper-left corner lands exactly on the device origin.
        let mut transform = Self::find_transform(ppu, region, size);
        let origin_user = transform.inverse() * Point::new(0.0, 0.0);
        let upper_left = Point::new(region.min().x, region.max().y);
        let shift = Vec2::new(origin_user.x - upper_left.x, origin_user.y - upper_left.y);
        transform = transform * Affine::translate(shift);

        // One scratch surface, reused for every layer.
        let mut scratch = self.backend().new_surface(size, self.antialias())?;
        for layer in self.layers() {
            if layer.visible() && !layer.is_blank() {
                layer.render_into(&mut scratch, transform, ppu)?;
                scratch.composite_onto(&mut output, layer.opacity());
            }
        }
        Ok(output)
    }

    /// Export everything that is drawn: fit a scale for a `maxpix`
    /// square, take the union bounding box at that scale, and render it.
    pub fn save_canvas(&mut self, maxpix: u32, background: bool) -> Result<B::Surface, CanvasError> {
        if self.n_visible_items() == 0 {
            return Err(CanvasError::NothingToExport);
        }
        let ppu = self.filled_ppu(maxpix as f64, maxpix as f64);
        let mut region = BBox::EMPTY;
        let visible: Vec<String> = self
            .layers()
            .filter(|l| l.visible() && !l.is_blank())
            .map(|l| l.name().to_string())
            .collect();
        for name in &visible {
            if let Some(layer) = self.layer_mut(name) {
                let bb = layer.find_bounding_box(ppu);
                region.absorb(&bb);
            }
        }
        if region.is_empty() {
            return Err(CanvasError::NothingToExport);
        }
        self.save_region(&region, maxpix, background)
    }

    /// `save_region` straight to a PNG file.
    pub fn save_region_png(
        &self,
        path: &Path,
        region: &BBox,
        maxpix: u32,
        background: bool,
    ) -> Result<(), CanvasError> {
        self.save_region(region, maxpix, background)?.write_png(path)
    }

    /// `save_canvas` straight to a PNG file.
    pub fn save_png(
        &mut self,
        path: &Path,
        maxpix: u32,
        background: bool,
    ) -> Result<(), CanvasError> {
        self.save_canvas(maxpix, background)?.write_png(path)
    }
}
