//! The per-pass draw context: user-space paths in, device pixels out.
//!
//! Paths are transformed to device space up front and handed to tiny-skia
//! with an identity transform, so stroke widths and dash lengths are
//! converted to device pixels here rather than relying on the
//! rasterizer's transform semantics.

use crate::text::{lock_engine, TextEngine};
use kurbo::{Affine, BezPath, PathEl, Point, Rect};
use peniko::Color;
use slateink_core::{DrawContext, FontSpec, ImageData, LineCap, LineJoin, StrokePen};
use std::sync::Mutex;
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

pub(crate) struct SkiaContext<'a> {
    pub(crate) pixmap: &'a mut Pixmap,
    pub(crate) engine: &'a Mutex<TextEngine>,
    pub(crate) transform: Affine,
    pub(crate) ppu: f64,
    pub(crate) antialias: bool,
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Flatten a user-space path into a device-space tiny-skia path. Returns
/// None for empty or degenerate paths, which are simply not drawn.
fn to_skia_path(transform: Affine, path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    let pt = |p: Point| transform * p;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                let p = pt(p);
                pb.move_to(p.x as f32, p.y as f32);
            }
            PathEl::LineTo(p) => {
                let p = pt(p);
                pb.line_to(p.x as f32, p.y as f32);
            }
            PathEl::QuadTo(c, p) => {
                let (c, p) = (pt(c), pt(p));
                pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let (c1, c2, p) = (pt(c1), pt(c2), pt(p));
                pb.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                );
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

impl SkiaContext<'_> {
    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(to_skia_color(color));
        paint.anti_alias = self.antialias;
        paint
    }

    fn stroke(&self, pen: &StrokePen) -> Stroke {
        let dash = if pen.dash.is_empty() {
            None
        } else {
            let pattern: Vec<f32> = pen.dash.iter().map(|d| (d * self.ppu) as f32).collect();
            StrokeDash::new(pattern, (pen.dash_offset * self.ppu) as f32)
        };
        Stroke {
            width: (pen.width * self.ppu) as f32,
            line_cap: match pen.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match pen.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash,
            ..Stroke::default()
        }
    }
}

impl DrawContext for SkiaContext<'_> {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn user_per_pixel(&self) -> f64 {
        1.0 / self.ppu
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        let Some(path) = to_skia_path(self.transform, path) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &self.paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke_path(&mut self, path: &BezPath, pen: &StrokePen, color: Color) {
        if pen.width <= 0.0 {
            return;
        }
        let Some(path) = to_skia_path(self.transform, path) else {
            return;
        };
        self.pixmap.stroke_path(
            &path,
            &self.paint(color),
            &self.stroke(pen),
            Transform::identity(),
            None,
        );
    }

    fn draw_image(&mut self, image: &ImageData, dest: Rect, alpha: f64) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let Some(source) = pixmap_from_image(image) else {
            log::warn!("skipping image draw: could not build source pixmap");
            return;
        };
        // The canvas transform is a flip-and-scale, so the device rect is
        // spanned by the transformed corners.
        let a = self.transform * Point::new(dest.x0, dest.y0);
        let b = self.transform * Point::new(dest.x1, dest.y1);
        let left = a.x.min(b.x) as f32;
        let top = a.y.min(b.y) as f32;
        let sx = (a.x - b.x).abs() as f32 / image.width() as f32;
        let sy = (a.y - b.y).abs() as f32 / image.height() as f32;
        if sx <= 0.0 || sy <= 0.0 {
            return;
        }
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0) as f32,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let ts = Transform::from_row(sx, 0.0, 0.0, sy, left, top);
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, ts, None);
    }

    fn draw_text(
        &mut self,
        anchor: Point,
        text: &str,
        font: &FontSpec,
        size_user: f64,
        angle: f64,
        color: Color,
    ) {
        let dev = self.transform * anchor;
        // User angles are counterclockwise with y up; device y points down.
        let angle_dev = -angle as f32;
        lock_engine(self.engine).draw(
            self.pixmap,
            (dev.x as f32, dev.y as f32),
            text,
            font,
            (size_user * self.ppu) as f32,
            angle_dev,
            color,
        );
    }
}

/// Copy straight-alpha RGBA into a premultiplied pixmap.
fn pixmap_from_image(image: &ImageData) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    let src = image.pixels();
    for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
        let (r, g, b, a) = (src[4 * i], src[4 * i + 1], src[4 * i + 2], src[4 * i + 3]);
        *px = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}
