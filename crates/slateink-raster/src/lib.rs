//! slateink-raster: a software rasterizer backend for slateink.
//!
//! Implements the core backend traits over [tiny-skia] pixmaps, with
//! text shaped and rasterized by [cosmic-text]. Everything runs on the
//! CPU; surfaces are plain RGBA pixel buffers that can be inspected,
//! composited, and written out as PNG.
//!
//! [tiny-skia]: https://docs.rs/tiny-skia
//! [cosmic-text]: https://docs.rs/cosmic-text

mod context;
mod text;

use context::SkiaContext;
use kurbo::Affine;
use peniko::Color;
use slateink_core::{Backend, CanvasError, DrawContext, PixelSize, Surface, TextMeasurer};
use std::path::Path;
use std::sync::{Arc, Mutex};
use text::TextEngine;
pub use text::CosmicMeasurer;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Coordinates in tiny-skia are f32; this keeps accumulated positions
/// well inside the exactly-representable integer range.
const MAX_SURFACE_DIM: u32 = 32767;

/// Software backend. Cheap to share per the canvas's needs: surfaces it
/// creates keep a handle to the backend's font system, so text rendered
/// into any of them uses the same fonts and shaping.
pub struct SkiaBackend {
    engine: Arc<Mutex<TextEngine>>,
    measurer: CosmicMeasurer,
}

impl SkiaBackend {
    pub fn new() -> Self {
        let engine = Arc::new(Mutex::new(TextEngine::new()));
        let measurer = CosmicMeasurer::new(Arc::clone(&engine));
        Self { engine, measurer }
    }
}

impl Default for SkiaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SkiaBackend {
    type Surface = SkiaSurface;

    fn new_surface(&self, size: PixelSize, antialias: bool) -> Result<Self::Surface, CanvasError> {
        let pixmap =
            Pixmap::new(size.width, size.height).ok_or(CanvasError::SurfaceAllocation {
                width: size.width,
                height: size.height,
            })?;
        Ok(SkiaSurface {
            pixmap,
            antialias,
            engine: Arc::clone(&self.engine),
        })
    }

    fn max_surface_dim(&self) -> u32 {
        MAX_SURFACE_DIM
    }

    fn measurer(&self) -> &dyn TextMeasurer {
        &self.measurer
    }
}

/// A CPU pixel buffer, premultiplied RGBA8.
pub struct SkiaSurface {
    pixmap: Pixmap,
    antialias: bool,
    engine: Arc<Mutex<TextEngine>>,
}

impl SkiaSurface {
    /// Straight-alpha RGBA8 color of one pixel, for inspection.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::from_rgba8(
            px.red(),
            px.green(),
            px.blue(),
            px.alpha(),
        ))
    }

    /// The underlying pixmap, premultiplied.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl Surface for SkiaSurface {
    fn size(&self) -> PixelSize {
        PixelSize::new(self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a));
    }

    fn context(&mut self, transform: Affine, ppu: f64) -> Box<dyn DrawContext + '_> {
        Box::new(SkiaContext {
            pixmap: &mut self.pixmap,
            engine: &self.engine,
            transform,
            ppu,
            antialias: self.antialias,
        })
    }

    fn composite_onto(&self, target: &mut Self, alpha: f64) {
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0) as f32,
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        target
            .pixmap
            .draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, Transform::identity(), None);
    }

    fn write_png(&self, path: &Path) -> Result<(), CanvasError> {
        self.pixmap
            .save_png(path)
            .map_err(|e| CanvasError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_allocation() {
        let backend = SkiaBackend::new();
        let surface = backend.new_surface(PixelSize::new(8, 4), true).unwrap();
        assert_eq!(surface.size(), PixelSize::new(8, 4));
        assert!(matches!(
            backend.new_surface(PixelSize::new(0, 4), true),
            Err(CanvasError::SurfaceAllocation { .. })
        ));
    }

    #[test]
    fn test_fill_and_clear() {
        let backend = SkiaBackend::new();
        let mut surface = backend.new_surface(PixelSize::new(2, 2), false).unwrap();
        surface.fill(Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(
            surface.pixel(0, 0).unwrap().to_rgba8().b,
            30,
        );
        surface.clear();
        assert_eq!(surface.pixel(0, 0).unwrap().to_rgba8().a, 0);
    }

    #[test]
    fn test_composite_opacity() {
        let backend = SkiaBackend::new();
        let mut under = backend.new_surface(PixelSize::new(1, 1), false).unwrap();
        let mut over = backend.new_surface(PixelSize::new(1, 1), false).unwrap();
        over.fill(Color::from_rgba8(255, 255, 255, 255));
        over.composite_onto(&mut under, 0.5);
        let px = under.pixel(0, 0).unwrap().to_rgba8();
        assert!(px.a > 100 && px.a < 155);
    }
}
