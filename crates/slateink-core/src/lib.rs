//! slateink-core: a retained-mode layered 2D vector canvas.
//!
//! Items (shapes, text, images) live on ordered [`Layer`]s; layers
//! render into private surfaces and composite bottom-to-top onto the
//! final target. Geometry is dual-unit: items have a scale-independent
//! bounding box in user units plus per-side pixel extents for the parts
//! that keep a fixed on-screen size, and the fit solver in this crate
//! reconciles the two when zooming to fill a window.
//!
//! The crate is rasterizer-agnostic: everything draws through the
//! capability traits in [`backend`]. A software implementation lives in
//! the companion `slateink-raster` crate.

pub mod backend;
pub mod canvas;
pub mod error;
mod export;
mod fit;
pub mod geometry;
pub mod input;
pub mod item;
pub mod items;
pub mod layer;
pub mod mainthread;
pub mod rubberband;
pub mod shared;
pub mod style;

#[cfg(test)]
pub(crate) mod testutil;

pub use backend::{Backend, DrawContext, FontSpec, ImageData, Surface, TextMeasurer};
pub use canvas::Canvas;
pub use error::CanvasError;
pub use geometry::{BBox, PixelPoint, PixelSize, Seg};
pub use input::{PointerEvent, PointerKind};
pub use item::{CanvasItem, ItemId, PixelExtents};
pub use items::{
    Arrowhead, Circle, Curve, Dot, Ellipse, Image, Polygon, Rectangle, Segment, SegmentSet, Text,
};
pub use layer::Layer;
pub use rubberband::{RubberBand, RubberBandKind, RubberBandStyle};
pub use shared::SharedCanvas;
pub use style::{LineCap, LineJoin, SerializableColor, ShapeStyle, StrokePen};
