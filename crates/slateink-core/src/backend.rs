//! Capability traits connecting the scene graph to a rasterizer.
//!
//! The core never names a concrete backend. A backend supplies surfaces
//! (pixel buffers that layers render into and composite between) and a
//! text measurer; a surface hands out draw contexts that accept paths in
//! user coordinates and apply the canvas transform.

use crate::error::CanvasError;
use crate::geometry::PixelSize;
use crate::style::StrokePen;
use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Font selection for text items. The size is interpreted in user units
/// unless `size_in_pixels` is set, in which case the text keeps its
/// on-screen size when the canvas is zoomed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    #[serde(default)]
    pub size_in_pixels: bool,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 12.0,
            size_in_pixels: false,
            bold: false,
            italic: false,
        }
    }
}

/// Raw RGBA8 pixel data for image items. Row-major, top row first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    /// A transparent image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Wrap existing RGBA8 data. Panics if the buffer length does not
    /// match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        4 * ((y as usize) * (self.width as usize) + x as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y);
        Color::from_rgba8(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        let rgba = color.to_rgba8();
        self.pixels[i] = rgba.r;
        self.pixels[i + 1] = rgba.g;
        self.pixels[i + 2] = rgba.b;
        self.pixels[i + 3] = rgba.a;
    }
}

/// A drawing target in user coordinates.
///
/// Paths arrive in user space; the context applies the canvas transform
/// (including the y flip to device space). Contexts are created per render
/// pass and hold no state the items need to restore, so a failed item
/// draw cannot corrupt subsequent ones.
pub trait DrawContext {
    /// The user-to-device transform this context draws through.
    fn transform(&self) -> Affine;

    /// User units per device pixel (the reciprocal of ppu). Items use
    /// this to resolve pixel-unit line widths and sizes.
    fn user_per_pixel(&self) -> f64;

    fn fill_path(&mut self, path: &BezPath, color: Color);

    fn stroke_path(&mut self, path: &BezPath, pen: &StrokePen, color: Color);

    /// Blit an image into the user-space rectangle `dest`, scaling as
    /// needed, with the given opacity.
    fn draw_image(&mut self, image: &ImageData, dest: Rect, alpha: f64);

    /// Draw text with its baseline-left anchor at `anchor` (user
    /// coordinates), rotated by `angle` radians about the anchor.
    /// `size_user` is the font size already resolved to user units.
    fn draw_text(
        &mut self,
        anchor: Point,
        text: &str,
        font: &FontSpec,
        size_user: f64,
        angle: f64,
        color: Color,
    );
}

/// Measures text without drawing it.
///
/// Returns ink extents relative to the baseline-left anchor at the origin,
/// in the same units as the font size, y up: `y1` is the ascent above the
/// baseline and `-y0` the descent below it.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> Rect;
}

/// A pixel buffer that layers render into and composite between.
pub trait Surface {
    fn size(&self) -> PixelSize;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Fill every pixel with an opaque color.
    fn fill(&mut self, color: Color);

    /// Begin a draw pass through the given user-to-device transform.
    /// `ppu` is the scale in pixels per user unit.
    fn context(&mut self, transform: Affine, ppu: f64) -> Box<dyn DrawContext + '_>;

    /// Alpha-blend this surface onto another of the same size.
    fn composite_onto(&self, target: &mut Self, alpha: f64)
    where
        Self: Sized;

    fn write_png(&self, path: &Path) -> Result<(), CanvasError>;
}

/// Factory for surfaces plus the backend's text measurer.
pub trait Backend {
    type Surface: Surface;

    fn new_surface(&self, size: PixelSize, antialias: bool) -> Result<Self::Surface, CanvasError>;

    /// Largest supported surface dimension, per side.
    fn max_surface_dim(&self) -> u32;

    fn measurer(&self) -> &dyn TextMeasurer;
}

/// Validate a requested surface size against a backend's limit.
pub fn check_surface_size<B: Backend>(backend: &B, size: PixelSize) -> Result<(), CanvasError> {
    let max = backend.max_surface_dim();
    if size.width > max || size.height > max {
        return Err(CanvasError::SurfaceTooLarge {
            width: size.width,
            height: size.height,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_pixel_round_trip() {
        let mut img = ImageData::new(4, 3);
        let red = Color::from_rgba8(255, 0, 0, 255);
        img.set_pixel(2, 1, red);
        assert_eq!(img.pixel(2, 1).to_rgba8().r, 255);
        assert_eq!(img.pixel(0, 0).to_rgba8().a, 0);
    }

    #[test]
    #[should_panic]
    fn test_image_bad_buffer_length() {
        ImageData::from_pixels(2, 2, vec![0; 7]);
    }
}
