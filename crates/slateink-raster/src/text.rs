//! Text shaping, measurement, and glyph rasterization via cosmic-text.
//!
//! One [`TextEngine`] per backend holds the font database and the swash
//! glyph cache; both the measurer and the draw contexts borrow it through
//! a mutex, so measuring and drawing agree on shaping down to the glyph.

use cosmic_text::{
    Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, SwashContent, Weight,
};
use kurbo::Rect;
use peniko::Color;
use slateink_core::{FontSpec, TextMeasurer};
use std::sync::{Arc, Mutex, MutexGuard};
use tiny_skia::{Pixmap, PremultipliedColorU8};

pub(crate) struct TextEngine {
    font_system: FontSystem,
    swash: SwashCache,
}

fn attrs(font: &FontSpec) -> Attrs<'_> {
    let family = match font.family.as_str() {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        name => Family::Name(name),
    };
    let mut attrs = Attrs::new().family(family);
    if font.bold {
        attrs = attrs.weight(Weight::BOLD);
    }
    if font.italic {
        attrs = attrs.style(Style::Italic);
    }
    attrs
}

/// A shaped glyph ready to blit: the swash image plus its pen position
/// relative to the baseline-left anchor, device convention (y down).
struct PlacedGlyph {
    cache_key: cosmic_text::CacheKey,
    x: f32,
    y: f32,
}

impl TextEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash: SwashCache::new(),
        }
    }

    /// Shape `text` at `size` and return the glyph pen positions relative
    /// to the first line's baseline-left corner.
    fn shape(&mut self, text: &str, font: &FontSpec, size: f32) -> Vec<PlacedGlyph> {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_text(&mut self.font_system, text, attrs(font), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut glyphs = Vec::new();
        let mut base_y = None;
        for run in buffer.layout_runs() {
            let base = *base_y.get_or_insert(run.line_y);
            for glyph in run.glyphs {
                let physical = glyph.physical((0.0, 0.0), 1.0);
                glyphs.push(PlacedGlyph {
                    cache_key: physical.cache_key,
                    x: physical.x as f32,
                    y: physical.y as f32 + run.line_y - base,
                });
            }
        }
        glyphs
    }

    /// Ink extents of `text` at the font's nominal size, relative to the
    /// baseline-left anchor, y up. Empty for whitespace-only text or when
    /// no font covers it.
    pub(crate) fn measure(&mut self, text: &str, font: &FontSpec) -> Rect {
        let glyphs = self.shape(text, font, font.size as f32);
        let mut x0 = f32::INFINITY;
        let mut x1 = f32::NEG_INFINITY;
        let mut y0 = f32::INFINITY;
        let mut y1 = f32::NEG_INFINITY;
        for glyph in &glyphs {
            let Some(image) = self
                .swash
                .get_image_uncached(&mut self.font_system, glyph.cache_key)
            else {
                continue;
            };
            if image.placement.width == 0 || image.placement.height == 0 {
                continue;
            }
            let left = glyph.x + image.placement.left as f32;
            let top = image.placement.top as f32 - glyph.y;
            x0 = x0.min(left);
            x1 = x1.max(left + image.placement.width as f32);
            y1 = y1.max(top);
            y0 = y0.min(top - image.placement.height as f32);
        }
        if x0 > x1 {
            return Rect::ZERO;
        }
        Rect::new(x0 as f64, y0 as f64, x1 as f64, y1 as f64)
    }

    /// Rasterize `text` into `pixmap` with the baseline-left anchor at
    /// `anchor` (device pixels), rotated by `angle` radians (device
    /// convention, y down). The glyph bitmaps themselves stay upright;
    /// only the pen positions rotate.
    pub(crate) fn draw(
        &mut self,
        pixmap: &mut Pixmap,
        anchor: (f32, f32),
        text: &str,
        font: &FontSpec,
        size_px: f32,
        angle: f32,
        color: Color,
    ) {
        let (sin, cos) = angle.sin_cos();
        let rgba = color.to_rgba8();
        let glyphs = self.shape(text, font, size_px);
        for glyph in &glyphs {
            let Some(image) = self
                .swash
                .get_image_uncached(&mut self.font_system, glyph.cache_key)
            else {
                continue;
            };
            let pen_x = anchor.0 + glyph.x * cos - glyph.y * sin;
            let pen_y = anchor.1 + glyph.x * sin + glyph.y * cos;
            let left = (pen_x + image.placement.left as f32).round() as i32;
            let top = (pen_y - image.placement.top as f32).round() as i32;
            let w = image.placement.width as i32;
            let h = image.placement.height as i32;
            for gy in 0..h {
                for gx in 0..w {
                    let coverage = match image.content {
                        SwashContent::Mask => image.data[(gy * w + gx) as usize],
                        SwashContent::Color | SwashContent::SubpixelMask => {
                            image.data[4 * (gy * w + gx) as usize + 3]
                        }
                    };
                    if coverage == 0 {
                        continue;
                    }
                    let alpha = coverage as u32 * rgba.a as u32 / 255;
                    blend_pixel(pixmap, left + gx, top + gy, rgba.r, rgba.g, rgba.b, alpha as u8);
                }
            }
        }
    }
}

/// Source-over blend of a straight-alpha color into one pixmap pixel.
fn blend_pixel(pixmap: &mut Pixmap, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
    if x < 0 || y < 0 || x >= pixmap.width() as i32 || y >= pixmap.height() as i32 {
        return;
    }
    let idx = (y as usize) * pixmap.width() as usize + x as usize;
    let dst = pixmap.pixels()[idx];
    let sa = a as u32;
    let inv = 255 - sa;
    let out_r = (r as u32 * sa + dst.red() as u32 * inv) / 255;
    let out_g = (g as u32 * sa + dst.green() as u32 * inv) / 255;
    let out_b = (b as u32 * sa + dst.blue() as u32 * inv) / 255;
    let out_a = sa + dst.alpha() as u32 * inv / 255;
    let out_a = out_a.min(255) as u8;
    if let Some(px) = PremultipliedColorU8::from_rgba(
        out_r.min(out_a as u32) as u8,
        out_g.min(out_a as u32) as u8,
        out_b.min(out_a as u32) as u8,
        out_a,
    ) {
        pixmap.pixels_mut()[idx] = px;
    }
}

/// [`TextMeasurer`] backed by the shared [`TextEngine`].
pub struct CosmicMeasurer {
    engine: Arc<Mutex<TextEngine>>,
}

impl CosmicMeasurer {
    pub(crate) fn new(engine: Arc<Mutex<TextEngine>>) -> Self {
        Self { engine }
    }
}

pub(crate) fn lock_engine(engine: &Mutex<TextEngine>) -> MutexGuard<'_, TextEngine> {
    match engine.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl TextMeasurer for CosmicMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> Rect {
        lock_engine(&self.engine).measure(text, font)
    }
}
