//! Rubber bands: transient drag feedback drawn on an overlay layer.
//!
//! A rubber band owns the items it puts on the layer and replaces them
//! on every pointer move. It is styled in device pixels so the feedback
//! has the same weight at any zoom. The caller dedicates a layer to the
//! overlay (usually the topmost, non-clickable) and forwards pointer
//! events in user coordinates.

use crate::backend::Backend;
use crate::geometry::Seg;
use crate::item::ItemId;
use crate::items::{Circle, Ellipse, Rectangle, Segment, SegmentSet};
use crate::layer::Layer;
use crate::style::{SerializableColor, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// What shape the band stretches into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RubberBandKind {
    /// A segment from the start point to the pointer.
    Line,
    /// An axis-aligned rectangle with the start point and the pointer at
    /// opposite corners.
    Rectangle,
    /// A circle centered on the start point through the pointer.
    Circle,
    /// An axis-aligned ellipse inscribed in the drag rectangle.
    Ellipse,
    /// Segments from each anchor to the pointer.
    Spider { anchors: Vec<Point> },
}

/// Visual configuration, all lengths in device pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubberBandStyle {
    pub color: SerializableColor,
    pub width: f64,
    /// Alternating on/off dash lengths. Empty means solid.
    pub dash: Vec<f64>,
    /// Color for the dash gaps, giving the classic two-tone marching
    /// band that stays visible on any background.
    pub dash_color: Option<SerializableColor>,
}

impl Default for RubberBandStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 2.0,
            dash: vec![4.0, 4.0],
            dash_color: Some(SerializableColor::white()),
        }
    }
}

impl RubberBandStyle {
    fn to_shape_style(&self) -> ShapeStyle {
        let mut style = ShapeStyle {
            line_color: Some(self.color),
            fill_color: None,
            ..ShapeStyle::default()
        };
        style.set_line_width_in_pixels(self.width);
        if !self.dash.is_empty() {
            style.set_dash_in_pixels(self.dash.clone(), 0.0);
            style.dash_color = self.dash_color;
        }
        style
    }
}

#[derive(Debug, Clone)]
pub struct RubberBand {
    kind: RubberBandKind,
    pub style: RubberBandStyle,
    start: Option<Point>,
    items: Vec<ItemId>,
}

impl RubberBand {
    pub fn new(kind: RubberBandKind) -> Self {
        Self {
            kind,
            style: RubberBandStyle::default(),
            start: None,
            items: Vec::new(),
        }
    }

    /// True between `start` and `stop`.
    pub fn active(&self) -> bool {
        self.start.is_some()
    }

    /// Begin a drag at `pt` (user coordinates).
    pub fn start<B: Backend>(&mut self, layer: &mut Layer<B>, pt: Point) {
        self.remove_items(layer);
        self.start = Some(pt);
        self.update(layer, pt);
    }

    /// Move the free end to `pt`, replacing the overlay items. Ignored
    /// when not active.
    pub fn update<B: Backend>(&mut self, layer: &mut Layer<B>, pt: Point) {
        let Some(start) = self.start else {
            return;
        };
        self.remove_items(layer);
        let style = self.style.to_shape_style();
        match &self.kind {
            RubberBandKind::Line => {
                let mut seg = Segment::new(start, pt);
                seg.style = style;
                self.items.push(layer.add_item(seg));
            }
            RubberBandKind::Rectangle => {
                let mut rect = Rectangle::new(start, pt);
                rect.style = style;
                self.items.push(layer.add_item(rect));
            }
            RubberBandKind::Circle => {
                let mut circle = Circle::new(start, (pt - start).hypot());
                circle.style = style;
                self.items.push(layer.add_item(circle));
            }
            RubberBandKind::Ellipse => {
                let center = start.midpoint(pt);
                let rx = 0.5 * (pt.x - start.x).abs();
                let ry = 0.5 * (pt.y - start.y).abs();
                let mut ellipse = Ellipse::new(center, rx, ry, 0.0);
                ellipse.style = style;
                self.items.push(layer.add_item(ellipse));
            }
            RubberBandKind::Spider { anchors } => {
                let segs = anchors.iter().map(|a| Seg::new(*a, pt)).collect();
                let mut set = SegmentSet::new(segs);
                set.style = style;
                self.items.push(layer.add_item(set));
            }
        }
    }

    /// End the drag and remove the overlay items.
    pub fn stop<B: Backend>(&mut self, layer: &mut Layer<B>) {
        self.remove_items(layer);
        self.start = None;
    }

    fn remove_items<B: Backend>(&mut self, layer: &mut Layer<B>) {
        for id in self.items.drain(..) {
            layer.remove_item(id);
        }
    }
}
