//! The canvas: ordered layers, the user-to-device transform, and the
//! render/composite loop.
//!
//! The transform maps user coordinates (y up) to device pixels (y down)
//! at a scale of `ppu` pixels per user unit, with the union bounding box
//! of all drawn content centered in the bitmap plus a margin.
//! `set_transform` is idempotent: when nothing changed it returns
//! without recomputing anything, so callers can invoke it before every
//! frame.

use crate::backend::{Backend, Surface, TextMeasurer};
use crate::error::CanvasError;
use crate::fit;
use crate::geometry::{BBox, PixelPoint, PixelSize};
use crate::item::CanvasItem;
use crate::layer::Layer;
use crate::mainthread;
use kurbo::{Affine, Point};
use peniko::Color;

pub struct Canvas<B: Backend> {
    backend: B,
    layers: Vec<Layer<B>>,
    ppu: f64,
    bbox: BBox,
    margin: f64,
    background: Color,
    antialias: bool,
    transform: Affine,
    surface_size: PixelSize,
    initialized: bool,
    pub(crate) window_size: PixelSize,
    pub(crate) draw_requested: bool,
    pub(crate) track_motion: bool,
}

impl<B: Backend> Canvas<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            layers: Vec::new(),
            ppu: 1.0,
            bbox: BBox::EMPTY,
            margin: 0.05,
            background: Color::WHITE,
            antialias: true,
            transform: Affine::IDENTITY,
            surface_size: PixelSize::default(),
            initialized: false,
            window_size: PixelSize::default(),
            draw_requested: false,
            track_motion: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend's text measurer, needed to construct text items.
    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.backend.measurer()
    }

    // ---- layer management ----

    /// Append a new layer on top of the stack and return it. Layer names
    /// are not required to be unique, but lookups by name find only the
    /// first match, so duplicates get a warning.
    pub fn new_layer(&mut self, name: impl Into<String>) -> &mut Layer<B> {
        let name = name.into();
        if self.layers.iter().any(|l| l.name() == name) {
            log::warn!("layer name is not unique: {:?}", name);
        }
        self.layers.push(Layer::new(name));
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    pub fn delete_layer(&mut self, name: &str) -> Result<(), CanvasError> {
        let pos = self
            .layers
            .iter()
            .position(|l| l.name() == name)
            .ok_or_else(|| CanvasError::NoSuchLayer(name.to_string()))?;
        self.layers.remove(pos);
        Ok(())
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, name: &str) -> Option<&Layer<B>> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer<B>> {
        self.layers.iter_mut().find(|l| l.name() == name)
    }

    /// Layer by stacking position, 0 at the bottom.
    pub fn layer_at(&self, index: usize) -> Option<&Layer<B>> {
        self.layers.get(index)
    }

    pub fn layer_at_mut(&mut self, index: usize) -> Option<&mut Layer<B>> {
        self.layers.get_mut(index)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer<B>> {
        self.layers.iter()
    }

    /// Move the layer at `index` up the stack by `howfar` positions,
    /// clamped at the top.
    pub fn raise_layer(&mut self, index: usize, howfar: usize) {
        if index >= self.layers.len() {
            return;
        }
        let dest = (index + howfar).min(self.layers.len() - 1);
        let layer = self.layers.remove(index);
        self.layers.insert(dest, layer);
    }

    /// Move the layer at `index` down the stack by `howfar` positions,
    /// clamped at the bottom.
    pub fn lower_layer(&mut self, index: usize, howfar: usize) {
        if index >= self.layers.len() {
            return;
        }
        let dest = index.saturating_sub(howfar);
        let layer = self.layers.remove(index);
        self.layers.insert(dest, layer);
    }

    pub fn raise_layer_to_top(&mut self, index: usize) {
        self.raise_layer(index, self.layers.len());
    }

    pub fn lower_layer_to_bottom(&mut self, index: usize) {
        self.lower_layer(index, self.layers.len());
    }

    /// Restack layers into the given bottom-to-top name order. Every
    /// current layer must appear exactly once.
    pub fn reorder_layers(&mut self, order: &[&str]) -> Result<(), CanvasError> {
        if order.len() != self.layers.len() {
            return Err(CanvasError::NoSuchLayer(format!(
                "reorder lists {} of {} layers",
                order.len(),
                self.layers.len()
            )));
        }
        let mut old = std::mem::take(&mut self.layers);
        for name in order {
            let pos = old
                .iter()
                .position(|l| l.name() == *name)
                .ok_or_else(|| CanvasError::NoSuchLayer(name.to_string()))?;
            self.layers.push(old.remove(pos));
        }
        Ok(())
    }

    // ---- global state ----

    pub fn empty(&self) -> bool {
        self.layers.iter().all(|l| l.is_blank())
    }

    pub fn n_visible_items(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| l.visible())
            .map(|l| l.n_items())
            .sum()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Fraction of the bounding box left blank around the content on
    /// each side. Takes effect at the next `set_transform`.
    pub fn set_margin(&mut self, margin: f64) {
        assert!(margin >= 0.0);
        self.margin = margin;
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Toggle antialiasing. Layer surfaces are rebuilt on their next
    /// render.
    pub fn set_antialias(&mut self, antialias: bool) {
        if self.antialias != antialias {
            self.antialias = antialias;
            for layer in &mut self.layers {
                layer.dirty = true;
            }
        }
    }

    pub fn ppu(&self) -> f64 {
        self.ppu
    }

    pub fn bounding_box(&self) -> BBox {
        self.bbox
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn surface_size(&self) -> PixelSize {
        self.surface_size
    }

    // ---- transform ----

    /// Bitmap size that fits the current bounding box at the current
    /// scale, plus the margin on every side.
    pub fn desired_bitmap_size(&self) -> PixelSize {
        let w = self.ppu * self.bbox.width() * (1.0 + 2.0 * self.margin);
        let h = self.ppu * self.bbox.height() * (1.0 + 2.0 * self.margin);
        PixelSize::new((w as u32).max(1), (h as u32).max(1))
    }

    /// The user-to-device transform that centers `bbox` at scale `ppu`
    /// in a bitmap of `size` pixels, with the y axis flipped.
    pub(crate) fn find_transform(ppu: f64, bbox: &BBox, size: PixelSize) -> Affine {
        let bbw = ppu * bbox.width();
        let bbh = ppu * bbox.height();
        let deltax = 0.5 * (size.width as f64 - bbw);
        let deltay = 0.5 * (size.height as f64 - bbh);
        let offset_x = ppu * bbox.min().x - deltax;
        let offset_y = ppu * bbox.min().y + deltay;
        Affine::new([ppu, 0.0, 0.0, -ppu, -offset_x, bbh + offset_y])
    }

    /// Recompute the transform for a new scale.
    ///
    /// Fast path: if the scale is unchanged, no non-blank layer is
    /// dirty, and the bitmap is already the desired size, this is a
    /// no-op. Otherwise the union bounding box is recomputed at the new
    /// scale, and if it or the scale actually changed, the transform and
    /// bitmap size are rebuilt and every layer is marked dirty.
    pub fn set_transform(&mut self, scale: f64) {
        assert!(scale > 0.0, "scale must be positive, got {scale}");
        let new_ppu = scale != self.ppu;
        let layers_changed = new_ppu
            || self
                .layers
                .iter()
                .any(|layer| !layer.is_blank() && layer.dirty);
        if self.initialized
            && !new_ppu
            && !layers_changed
            && self.surface_size == self.desired_bitmap_size()
        {
            return;
        }

        let mut bbox = BBox::EMPTY;
        for layer in &mut self.layers {
            if !layer.is_blank() {
                bbox.absorb(&layer.find_bounding_box(scale));
            }
        }

        if bbox.is_empty() {
            self.transform = Affine::IDENTITY;
        } else if new_ppu || !self.initialized || bbox != self.bbox {
            self.bbox = bbox;
            self.ppu = scale;
            self.surface_size = self.desired_bitmap_size();
            self.transform = Self::find_transform(self.ppu, &self.bbox, self.surface_size);
            for layer in &mut self.layers {
                layer.dirty = true;
            }
        }
        self.initialized = true;
    }

    // ---- coordinate conversion ----

    pub fn user_to_pixel(&self, pt: Point) -> PixelPoint {
        let dev = self.transform * pt;
        PixelPoint::new(dev.x.floor() as i32, dev.y.floor() as i32)
    }

    pub fn pixel_to_user(&self, px: PixelPoint) -> Point {
        self.transform.inverse() * Point::new(px.x as f64, px.y as f64)
    }

    /// Convert a distance from user units to pixels.
    pub fn user_to_pixel_dist(&self, d: f64) -> f64 {
        d * self.ppu
    }

    pub fn pixel_to_user_dist(&self, d: f64) -> f64 {
        assert!(self.ppu > 0.0);
        d / self.ppu
    }

    // ---- rendering ----

    /// Render dirty layers and composite everything onto `target`, which
    /// must match the canvas surface size. The background fills the
    /// target first; layers stack bottom to top with their opacities.
    pub fn draw_to(&mut self, target: &mut B::Surface) -> Result<(), CanvasError> {
        mainthread::require_main_thread();
        debug_assert!(self.initialized, "set_transform before drawing");
        debug_assert_eq!(target.size(), self.surface_size);
        for layer in &mut self.layers {
            if !layer.is_blank() {
                layer.render(
                    &self.backend,
                    self.surface_size,
                    self.transform,
                    self.ppu,
                    self.antialias,
                )?;
            }
        }
        target.fill(self.background);
        for layer in &self.layers {
            layer.composite_onto(target);
        }
        Ok(())
    }

    /// Allocate a surface of the canvas size and draw into it.
    pub fn draw(&mut self) -> Result<B::Surface, CanvasError> {
        crate::backend::check_surface_size(&self.backend, self.surface_size)?;
        let mut target = self.backend.new_surface(self.surface_size, self.antialias)?;
        self.draw_to(&mut target)?;
        Ok(target)
    }

    // ---- queries ----

    /// Items under a user-space point, searched in clickable layers only,
    /// returned in paint order: the topmost hit is last.
    pub fn clicked_items(&self, pt: Point) -> Vec<&dyn CanvasItem> {
        let mut hits = Vec::new();
        for layer in &self.layers {
            if layer.clickable() {
                layer.clicked_items(pt, self.ppu, &mut hits);
            }
        }
        hits
    }

    pub fn all_items(&self) -> Vec<&dyn CanvasItem> {
        let mut items = Vec::new();
        for layer in &self.layers {
            layer.all_items(&mut items);
        }
        items
    }

    // ---- fitting ----

    /// The scale at which the visible content exactly fills an `xsize`
    /// by `ysize` pixel target. Returns 1.0 when there is nothing to fit.
    pub fn filled_ppu(&self, xsize: f64, ysize: f64) -> f64 {
        let items = self
            .layers
            .iter()
            .filter(|l| l.visible())
            .flat_map(|l| l.items());
        fit::filled_ppu(items, xsize, ysize)
    }

    /// Fit the content to the given window and set the transform
    /// accordingly.
    pub fn zoom_to_fill(&mut self, window: PixelSize) {
        let margin_scale = 1.0 + 2.0 * self.margin;
        let ppu = self.filled_ppu(
            window.width as f64 / margin_scale,
            window.height as f64 / margin_scale,
        );
        self.set_transform(ppu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Circle, Dot, Rectangle, Segment};
    use crate::testutil::FakeBackend;

    fn canvas() -> Canvas<FakeBackend> {
        Canvas::new(FakeBackend::default())
    }

    fn filled(mut circle: Circle) -> Circle {
        circle.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        circle
    }

    #[test]
    fn test_duplicate_layer_names_allowed() {
        let mut canvas = canvas();
        canvas.new_layer("a");
        canvas.new_layer("a");
        assert_eq!(canvas.n_layers(), 2);
    }

    #[test]
    fn test_delete_layer() {
        let mut canvas = canvas();
        canvas.new_layer("a");
        canvas.new_layer("b");
        canvas.delete_layer("a").unwrap();
        assert_eq!(canvas.n_layers(), 1);
        assert!(canvas.layer("a").is_none());
        assert!(canvas.delete_layer("zzz").is_err());
    }

    #[test]
    fn test_raise_lower_layers() {
        let mut canvas = canvas();
        canvas.new_layer("a");
        canvas.new_layer("b");
        canvas.new_layer("c");
        canvas.raise_layer(0, 1);
        let names: Vec<_> = canvas.layers().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["b", "a", "c"]);
        canvas.raise_layer_to_top(0);
        let names: Vec<_> = canvas.layers().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["a", "c", "b"]);
        canvas.lower_layer_to_bottom(2);
        let names: Vec<_> = canvas.layers().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_reorder_layers() {
        let mut canvas = canvas();
        canvas.new_layer("a");
        canvas.new_layer("b");
        canvas.new_layer("c");
        canvas.reorder_layers(&["c", "a", "b"]).unwrap();
        let names: Vec<_> = canvas.layers().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert!(canvas.reorder_layers(&["c", "a"]).is_err());
        assert!(canvas.reorder_layers(&["c", "a", "nope"]).is_err());
    }

    #[test]
    fn test_set_transform_centers_bbox() {
        let mut canvas = canvas();
        canvas.set_margin(0.0);
        canvas
            .new_layer("main")
            .add_item(filled(Circle::new(Point::new(5.0, 5.0), 5.0)));
        canvas.set_transform(10.0);
        // bbox [0,10]^2 at ppu 10 with no margin: 100x100 bitmap.
        assert_eq!(canvas.surface_size(), PixelSize::new(100, 100));
        // User origin (bottom-left of the bbox) maps to the bottom-left
        // pixel corner; y is flipped.
        let origin = canvas.transform() * Point::new(0.0, 0.0);
        assert!((origin.x).abs() < 1e-9);
        assert!((origin.y - 100.0).abs() < 1e-9);
        let top = canvas.transform() * Point::new(10.0, 10.0);
        assert!((top.x - 100.0).abs() < 1e-9);
        assert!((top.y).abs() < 1e-9);
    }

    #[test]
    fn test_set_transform_fast_path() {
        let mut canvas = canvas();
        let layer = canvas.new_layer("main");
        layer.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        canvas.set_transform(4.0);
        let n = canvas.layer_at(0).unwrap().bbox_recompute_count();
        // Same scale, nothing dirty: no bbox work at all.
        canvas.set_transform(4.0);
        assert_eq!(canvas.layer_at(0).unwrap().bbox_recompute_count(), n);
        // New scale forces a recompute.
        canvas.set_transform(8.0);
        assert!(canvas.layer_at(0).unwrap().bbox_recompute_count() > n);
    }

    #[test]
    fn test_set_transform_marks_layers_dirty_on_rescale() {
        let backend = FakeBackend::default();
        let mut canvas = Canvas::new(backend);
        canvas
            .new_layer("main")
            .add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        canvas.set_transform(4.0);
        canvas.draw().unwrap();
        assert!(!canvas.layer_at(0).unwrap().dirty);
        canvas.set_transform(8.0);
        assert!(canvas.layer_at(0).unwrap().dirty);
    }

    #[test]
    fn test_margin_grows_bitmap() {
        let mut canvas = canvas();
        canvas.set_margin(0.1);
        canvas
            .new_layer("main")
            .add_item(filled(Circle::new(Point::new(5.0, 5.0), 5.0)));
        canvas.set_transform(10.0);
        assert_eq!(canvas.surface_size(), PixelSize::new(120, 120));
    }

    #[test]
    fn test_pixel_user_round_trip() {
        let mut canvas = canvas();
        canvas.set_margin(0.0);
        canvas
            .new_layer("main")
            .add_item(filled(Circle::new(Point::new(5.0, 5.0), 5.0)));
        canvas.set_transform(10.0);
        let px = canvas.user_to_pixel(Point::new(2.5, 7.5));
        assert_eq!(px, PixelPoint::new(25, 25));
        let back = canvas.pixel_to_user(px);
        assert!((back.x - 2.5).abs() < 1e-9);
        assert!((back.y - 7.5).abs() < 1e-9);
        assert!((canvas.user_to_pixel_dist(2.0) - 20.0).abs() < 1e-9);
        assert!((canvas.pixel_to_user_dist(20.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_composites_visible_layers_only() {
        let mut canvas = canvas();
        canvas
            .new_layer("under")
            .add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        let hidden = canvas.new_layer("hidden");
        hidden.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        hidden.set_visible(false);
        canvas.new_layer("blank");
        canvas.set_transform(4.0);
        let target = canvas.draw().unwrap();
        assert_eq!(target.composites_received(), 1);
        assert_eq!(target.background, Some(canvas.background()));
    }

    #[test]
    fn test_layer_opacity_passed_to_composite() {
        let mut canvas = canvas();
        let layer = canvas.new_layer("main");
        layer.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        layer.set_opacity(0.5);
        canvas.set_transform(4.0);
        let target = canvas.draw().unwrap();
        assert_eq!(target.last_alpha, Some(0.5));
    }

    #[test]
    fn test_clicked_items_respect_clickable_and_order() {
        let mut canvas = canvas();
        let below = canvas.new_layer("below");
        below.set_clickable(true);
        let id_a = below.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        let above = canvas.new_layer("above");
        above.set_clickable(true);
        let id_b = above.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));
        let inert = canvas.new_layer("inert");
        inert.add_item(filled(Circle::new(Point::new(0.0, 0.0), 5.0)));

        let hits = canvas.clicked_items(Point::new(0.0, 0.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id(), id_a);
        assert_eq!(hits[1].id(), id_b);
        // the topmost item is the last
        assert_eq!(hits.last().map(|i| i.id()), Some(id_b));
    }

    #[test]
    fn test_hit_miss_outside_geometry() {
        let mut canvas = canvas();
        let layer = canvas.new_layer("main");
        layer.set_clickable(true);
        let mut seg = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        seg.style.set_line_width(1.0);
        layer.add_item(seg);
        assert_eq!(canvas.clicked_items(Point::new(5.0, 0.2)).len(), 1);
        assert_eq!(canvas.clicked_items(Point::new(5.0, 2.0)).len(), 0);
    }

    #[test]
    fn test_n_visible_items_and_empty() {
        let mut canvas = canvas();
        assert!(canvas.empty());
        let layer = canvas.new_layer("main");
        layer.add_item(Rectangle::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0)));
        assert!(!canvas.empty());
        assert_eq!(canvas.n_visible_items(), 1);
        canvas.layer_mut("main").unwrap().set_visible(false);
        assert_eq!(canvas.n_visible_items(), 0);
    }

    #[test]
    fn test_zoom_to_fill_is_idempotent() {
        let mut canvas = canvas();
        canvas.set_margin(0.0);
        let layer = canvas.new_layer("main");
        layer.add_item(filled(Circle::new(Point::new(5.0, 5.0), 5.0)));
        layer.add_item(Dot::new(Point::new(5.0, 5.0), 25.0));
        let window = PixelSize::new(800, 600);
        canvas.zoom_to_fill(window);
        let first = canvas.ppu();
        // The 10-unit circle governs the fit: 10 ppu = 600.
        assert!((first - 60.0).abs() < 1e-9);
        canvas.zoom_to_fill(window);
        // Fitting again at the same window size finds the same scale.
        assert!((canvas.ppu() - first).abs() < 1e-9);
        // And the resulting bitmap fits the window.
        let size = canvas.surface_size();
        assert!(size.width <= 800 && size.height <= 600);
    }

    #[test]
    fn test_transform_identity_when_empty() {
        let mut canvas = canvas();
        canvas.new_layer("main");
        canvas.set_transform(3.0);
        assert_eq!(canvas.transform(), Affine::IDENTITY);
    }

    #[test]
    #[should_panic]
    fn test_nonpositive_scale_panics() {
        let mut canvas = canvas();
        canvas.set_transform(0.0);
    }
}
