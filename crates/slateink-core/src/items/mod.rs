//! Concrete canvas items.

mod circle;
mod image;
mod polygon;
mod rectangle;
mod segment;
mod text;

pub use circle::{Circle, Dot, Ellipse};
pub use image::Image;
pub use polygon::{Curve, Polygon};
pub use rectangle::Rectangle;
pub use segment::{Arrowhead, Segment, SegmentSet};
pub use text::Text;

use crate::style::ShapeStyle;

/// Half-line-width margins for shapes whose stroke is centered on the
/// path: `(user_margin, pixel_margin)`. Exactly one is nonzero, chosen by
/// the style's width unit.
pub(crate) fn stroke_margins(style: &ShapeStyle) -> (f64, f64) {
    if !style.lined() {
        return (0.0, 0.0);
    }
    let half = 0.5 * style.line_width;
    if style.width_in_pixels {
        (0.0, half)
    } else {
        (half, 0.0)
    }
}
