//! Line segments, segment sets, and arrowhead decorations.

use crate::backend::DrawContext;
use crate::error::CanvasError;
use crate::geometry::{BBox, Seg};
use crate::item::{CanvasItem, ItemId, PixelExtents};
use crate::items::stroke_margins;
use crate::style::{SerializableColor, ShapeStyle};
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// A single line segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    id: ItemId,
    pub seg: Seg,
    pub style: ShapeStyle,
}

impl Segment {
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            seg: Seg::new(p0, p1),
            style: ShapeStyle::default(),
        }
    }
}

impl CanvasItem for Segment {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let mut bb = BBox::new(self.seg.p0, self.seg.p1);
        let (user, _) = stroke_margins(&self.style);
        bb.expand(user, user);
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        let (_, px) = stroke_margins(&self.style);
        PixelExtents::uniform(px)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        let mut path = BezPath::new();
        path.move_to(self.seg.p0);
        path.line_to(self.seg.p1);
        self.style.stroke_path(ctx, &path);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let lw = self.style.line_width_user(1.0 / ppu);
        let (alpha, d2) = self.seg.projection(pt);
        (0.0..=1.0).contains(&alpha) && d2 < 0.25 * lw * lw
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A batch of segments sharing one style. Cheaper than one item per
/// segment when drawing meshes or grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSet {
    id: ItemId,
    pub segs: Vec<Seg>,
    pub style: ShapeStyle,
}

impl SegmentSet {
    pub fn new(segs: Vec<Seg>) -> Self {
        Self {
            id: Uuid::new_v4(),
            segs,
            style: ShapeStyle::default(),
        }
    }

    pub fn add(&mut self, p0: Point, p1: Point) {
        self.segs.push(Seg::new(p0, p1));
    }
}

impl CanvasItem for SegmentSet {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let mut bb = BBox::EMPTY;
        for seg in &self.segs {
            bb.absorb_point(seg.p0);
            bb.absorb_point(seg.p1);
        }
        let (user, _) = stroke_margins(&self.style);
        bb.expand(user, user);
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        let (_, px) = stroke_margins(&self.style);
        PixelExtents::uniform(px)
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.segs.is_empty() {
            return Ok(());
        }
        let mut path = BezPath::new();
        for seg in &self.segs {
            path.move_to(seg.p0);
            path.line_to(seg.p1);
        }
        self.style.stroke_path(ctx, &path);
        Ok(())
    }

    fn contains_point(&self, pt: Point, ppu: f64) -> bool {
        let lw = self.style.line_width_user(1.0 / ppu);
        let r2 = 0.25 * lw * lw;
        self.segs.iter().any(|seg| {
            let (alpha, d2) = seg.projection(pt);
            (0.0..=1.0).contains(&alpha) && d2 < r2
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A filled triangular arrowhead decorating a segment.
///
/// The tip sits at fractional `position` along the segment (0 at `p0`, 1
/// at `p1`) pointing along the segment direction, or against it when
/// reversed. Sized either in user units or in device pixels; in pixel
/// mode the bare box degenerates to the tip and the triangle's footprint
/// moves into the pixel extents. Arrowheads are decorations and are never
/// hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrowhead {
    id: ItemId,
    pub seg: Seg,
    pub position: f64,
    pub reversed: bool,
    pub color: SerializableColor,
    width: f64,
    length: f64,
    size_in_pixels: bool,
}

impl Arrowhead {
    pub fn new(seg: Seg, position: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            seg,
            position,
            reversed: false,
            color: SerializableColor::black(),
            width: 0.0,
            length: 0.0,
            size_in_pixels: false,
        }
    }

    /// Size the arrowhead in user units: `width` across the segment,
    /// `length` along it.
    pub fn set_size(&mut self, width: f64, length: f64) {
        self.width = width;
        self.length = length;
        self.size_in_pixels = false;
    }

    /// Size the arrowhead in device pixels so it keeps its on-screen size
    /// when the canvas is zoomed.
    pub fn set_size_in_pixels(&mut self, width: f64, length: f64) {
        self.width = width;
        self.length = length;
        self.size_in_pixels = true;
    }

    fn tip(&self) -> Point {
        self.seg.interpolate(self.position)
    }

    /// Triangle corners for unit-scale sizes, rotated into the segment
    /// frame, relative to the tip.
    fn local_corners(&self) -> [Vec2; 3] {
        let l = if self.reversed {
            self.length
        } else {
            -self.length
        };
        let w = 0.5 * self.width;
        let c = self.seg.angle().cos();
        let s = self.seg.angle().sin();
        let rot = |x: f64, y: f64| Vec2::new(x * c - y * s, x * s + y * c);
        [Vec2::ZERO, rot(l, w), rot(l, -w)]
    }
}

impl CanvasItem for Arrowhead {
    fn id(&self) -> ItemId {
        self.id
    }

    fn bare_bbox(&self) -> BBox {
        let tip = self.tip();
        if self.size_in_pixels {
            return BBox::from_point(tip);
        }
        let mut bb = BBox::from_point(tip);
        for corner in self.local_corners() {
            bb.absorb_point(tip + corner);
        }
        bb
    }

    fn pixel_extents(&self) -> PixelExtents {
        if !self.size_in_pixels {
            return PixelExtents::ZERO;
        }
        // The local corners are already in pixel units in this mode.
        let mut ext = PixelExtents::ZERO;
        for corner in self.local_corners() {
            ext.left = ext.left.max(-corner.x);
            ext.right = ext.right.max(corner.x);
            ext.up = ext.up.max(corner.y);
            ext.down = ext.down.max(-corner.y);
        }
        ext
    }

    fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), CanvasError> {
        if self.width <= 0.0 || self.length <= 0.0 {
            log::debug!("skipping unsized arrowhead at {:?}", self.tip());
            return Ok(());
        }
        let scale = if self.size_in_pixels {
            ctx.user_per_pixel()
        } else {
            1.0
        };
        let tip = self.tip();
        let mut path = BezPath::new();
        path.move_to(tip);
        for corner in &self.local_corners()[1..] {
            path.line_to(tip + *corner * scale);
        }
        path.close_path();
        ctx.fill_path(&path, self.color.into());
        Ok(())
    }

    fn contains_point(&self, _pt: Point, _ppu: f64) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
