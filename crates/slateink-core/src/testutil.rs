//! In-memory backend for unit tests: records operations, draws nothing.

use crate::backend::{Backend, DrawContext, FontSpec, ImageData, Surface, TextMeasurer};
use crate::error::CanvasError;
use crate::geometry::PixelSize;
use crate::style::StrokePen;
use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;
use std::cell::Cell;
use std::path::Path;

/// Measurer with fixed metrics: 0.6em advance per char, 0.8em ascent,
/// 0.2em descent.
#[derive(Debug, Default)]
pub struct FakeMeasurer;

impl TextMeasurer for FakeMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> Rect {
        let w = 0.6 * font.size * text.chars().count() as f64;
        Rect::new(0.0, -0.2 * font.size, w, 0.8 * font.size)
    }
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    surfaces: Cell<u32>,
    measurer: FakeMeasurer,
}

impl FakeBackend {
    pub fn surfaces_created(&self) -> u32 {
        self.surfaces.get()
    }
}

impl Backend for FakeBackend {
    type Surface = FakeSurface;

    fn new_surface(&self, size: PixelSize, antialias: bool) -> Result<FakeSurface, CanvasError> {
        crate::backend::check_surface_size(self, size)?;
        self.surfaces.set(self.surfaces.get() + 1);
        Ok(FakeSurface {
            size,
            antialias,
            clears: 0,
            background: None,
            fills: 0,
            strokes: 0,
            images: 0,
            texts: 0,
            composites: 0,
            last_alpha: None,
        })
    }

    fn max_surface_dim(&self) -> u32 {
        32767
    }

    fn measurer(&self) -> &dyn TextMeasurer {
        &self.measurer
    }
}

#[derive(Debug)]
pub struct FakeSurface {
    size: PixelSize,
    pub antialias: bool,
    pub clears: u32,
    pub background: Option<Color>,
    pub fills: u32,
    pub strokes: u32,
    pub images: u32,
    pub texts: u32,
    composites: u32,
    pub last_alpha: Option<f64>,
}

impl FakeSurface {
    pub fn composites_received(&self) -> u32 {
        self.composites
    }

    pub fn draw_ops(&self) -> u32 {
        self.fills + self.strokes + self.images + self.texts
    }
}

impl Surface for FakeSurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.background = None;
    }

    fn fill(&mut self, color: Color) {
        self.background = Some(color);
    }

    fn context(&mut self, transform: Affine, ppu: f64) -> Box<dyn DrawContext + '_> {
        Box::new(FakeContext {
            surface: self,
            transform,
            ppu,
        })
    }

    fn composite_onto(&self, target: &mut Self, alpha: f64) {
        target.composites += 1;
        target.last_alpha = Some(alpha);
    }

    fn write_png(&self, _path: &Path) -> Result<(), CanvasError> {
        Ok(())
    }
}

struct FakeContext<'a> {
    surface: &'a mut FakeSurface,
    transform: Affine,
    ppu: f64,
}

impl DrawContext for FakeContext<'_> {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn user_per_pixel(&self) -> f64 {
        1.0 / self.ppu
    }

    fn fill_path(&mut self, _path: &BezPath, _color: Color) {
        self.surface.fills += 1;
    }

    fn stroke_path(&mut self, _path: &BezPath, _pen: &StrokePen, _color: Color) {
        self.surface.strokes += 1;
    }

    fn draw_image(&mut self, _image: &ImageData, _dest: Rect, _alpha: f64) {
        self.surface.images += 1;
    }

    fn draw_text(
        &mut self,
        _anchor: Point,
        _text: &str,
        _font: &FontSpec,
        _size_user: f64,
        _angle: f64,
        _color: Color,
    ) {
        self.surface.texts += 1;
    }
}
