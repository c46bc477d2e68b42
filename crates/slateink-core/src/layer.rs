//! Layers: ordered item lists with a private raster surface.
//!
//! Each layer renders its items into its own surface and is composited
//! onto the final target with its opacity. Rendering is dirty-tracked:
//! a clean layer's surface and bounding box are reused untouched, which
//! is what makes pan/scroll cheap. Anything that changes the drawn
//! content marks the layer dirty; the canvas marks every layer dirty
//! when the transform changes.

use crate::backend::{Backend, Surface};
use crate::error::CanvasError;
use crate::geometry::{BBox, PixelSize};
use crate::item::{CanvasItem, ItemId};
use kurbo::{Affine, Point};
use peniko::Color;
use std::path::Path;

pub struct Layer<B: Backend> {
    name: String,
    items: Vec<Box<dyn CanvasItem>>,
    surface: Option<B::Surface>,
    surface_antialias: bool,
    pub(crate) dirty: bool,
    visible: bool,
    clickable: bool,
    opacity: f64,
    clear_paint: Option<Color>,
    cached_bbox: BBox,
    cached_ppu: f64,
    bbox_valid: bool,
    bbox_dirty: bool,
    recomputes: u64,
}

impl<B: Backend> std::fmt::Debug for Layer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("items", &self.items.len())
            .field("dirty", &self.dirty)
            .field("visible", &self.visible)
            .finish()
    }
}

impl<B: Backend> Layer<B> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            surface: None,
            surface_antialias: true,
            dirty: true,
            visible: true,
            clickable: false,
            opacity: 1.0,
            clear_paint: None,
            cached_bbox: BBox::EMPTY,
            cached_ppu: 0.0,
            bbox_valid: false,
            bbox_dirty: true,
            recomputes: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A blank layer draws nothing and is skipped when compositing.
    pub fn is_blank(&self) -> bool {
        self.items.is_empty() && self.clear_paint.is_none()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        self.bbox_dirty = true;
    }

    /// Append an item. Items paint in insertion order, so later items
    /// cover earlier ones.
    pub fn add_item<I: CanvasItem + 'static>(&mut self, item: I) -> ItemId {
        let id = item.id();
        self.items.push(Box::new(item));
        self.mark_changed();
        id
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Box<dyn CanvasItem>> {
        let pos = self.items.iter().position(|i| i.id() == id)?;
        self.mark_changed();
        Some(self.items.remove(pos))
    }

    pub fn item(&self, id: ItemId) -> Option<&dyn CanvasItem> {
        self.items.iter().find(|i| i.id() == id).map(|b| b.as_ref())
    }

    /// Mutable access to an item. Marks the layer dirty, since the
    /// caller is presumed to change the item.
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut dyn CanvasItem> {
        let item = self.items.iter_mut().find(|i| i.id() == id)?;
        self.dirty = true;
        self.bbox_dirty = true;
        Some(item.as_mut())
    }

    /// Typed access to an item.
    pub fn item_as<T: CanvasItem + 'static>(&self, id: ItemId) -> Option<&T> {
        self.item(id)?.as_any().downcast_ref()
    }

    /// Typed mutable access to an item. Marks the layer dirty.
    pub fn item_as_mut<T: CanvasItem + 'static>(&mut self, id: ItemId) -> Option<&mut T> {
        self.item_mut(id)?.as_any_mut().downcast_mut()
    }

    pub fn items(&self) -> impl Iterator<Item = &dyn CanvasItem> {
        self.items.iter().map(|b| b.as_ref())
    }

    pub fn remove_all_items(&mut self) {
        self.items.clear();
        self.mark_changed();
    }

    /// Paint the whole layer with an opaque color underneath its items,
    /// instead of leaving it transparent.
    pub fn set_clear_color(&mut self, color: Option<Color>) {
        self.clear_paint = color;
        self.mark_changed();
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the layer. Only affects compositing, not the cached
    /// render.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn clickable(&self) -> bool {
        self.clickable
    }

    pub fn set_clickable(&mut self, clickable: bool) {
        self.clickable = clickable;
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Union bounding box of the layer's items at scale `ppu`, cached.
    ///
    /// The cache is reused unless the layer changed or the scale differs
    /// from the cached one. Pixel extents make the box scale-dependent,
    /// which is why the ppu participates in cache validity.
    pub fn find_bounding_box(&mut self, ppu: f64) -> BBox {
        if self.bbox_dirty || !self.bbox_valid || ppu != self.cached_ppu {
            let mut bb = BBox::EMPTY;
            for item in &self.items {
                bb.absorb(&item.full_bbox(ppu));
            }
            self.cached_bbox = bb;
            self.cached_ppu = ppu;
            self.bbox_valid = true;
            self.bbox_dirty = false;
            self.recomputes += 1;
        }
        self.cached_bbox
    }

    #[cfg(test)]
    pub(crate) fn bbox_recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Render the layer into its surface if it is dirty. A clean layer
    /// with a right-sized surface is a no-op.
    pub fn render(
        &mut self,
        backend: &B,
        size: PixelSize,
        transform: Affine,
        ppu: f64,
        antialias: bool,
    ) -> Result<(), CanvasError> {
        let surface_ok = self
            .surface
            .as_ref()
            .map(|s| s.size() == size && self.surface_antialias == antialias)
            .unwrap_or(false);
        if !self.dirty && surface_ok {
            return Ok(());
        }
        log::trace!("rendering layer {:?} at {}x{}", self.name, size.width, size.height);
        if !surface_ok {
            self.surface = Some(backend.new_surface(size, antialias)?);
            self.surface_antialias = antialias;
        }
        let mut surface = match self.surface.take() {
            Some(s) => s,
            None => return Ok(()),
        };
        let result = self.render_into(&mut surface, transform, ppu);
        self.surface = Some(surface);
        result?;
        self.dirty = false;
        Ok(())
    }

    /// Clear an arbitrary surface (or paint it with the layer's clear
    /// color) and draw the items into it, without touching the layer's
    /// own surface or dirty state. Export renders through this into a
    /// transient scratch surface.
    pub fn render_into(
        &self,
        surface: &mut B::Surface,
        transform: Affine,
        ppu: f64,
    ) -> Result<(), CanvasError> {
        match self.clear_paint {
            Some(color) => surface.fill(color),
            None => surface.clear(),
        }
        let mut ctx = surface.context(transform, ppu);
        for item in &self.items {
            item.draw(ctx.as_mut())?;
        }
        Ok(())
    }

    /// Alpha-composite the rendered surface onto a target. Invisible and
    /// blank layers are skipped.
    pub fn composite_onto(&self, target: &mut B::Surface) {
        if !self.visible || self.is_blank() {
            return;
        }
        if let Some(surface) = &self.surface {
            surface.composite_onto(target, self.opacity);
        }
    }

    /// Collect items whose footprint and geometry contain the point, in
    /// paint order (topmost last). The bounding-box test is a cheap
    /// prefilter before the exact per-item test.
    pub fn clicked_items<'a>(
        &'a self,
        pt: Point,
        ppu: f64,
        out: &mut Vec<&'a dyn CanvasItem>,
    ) {
        for item in &self.items {
            if item.full_bbox(ppu).contains(pt) && item.contains_point(pt, ppu) {
                out.push(item.as_ref());
            }
        }
    }

    pub fn all_items<'a>(&'a self, out: &mut Vec<&'a dyn CanvasItem>) {
        for item in &self.items {
            out.push(item.as_ref());
        }
    }

    /// Write the layer's rendered surface as a PNG. Errors if the layer
    /// has never been rendered.
    pub fn write_png(&self, path: &Path) -> Result<(), CanvasError> {
        match &self.surface {
            Some(surface) => surface.write_png(path),
            None => Err(CanvasError::NothingToExport),
        }
    }
}
