//! Stroke and fill styling for shapes.
//!
//! Line widths and dash lengths can be given in user units (they zoom with
//! the canvas) or in device pixels (they stay a fixed size on screen). The
//! style resolves to a [`StrokePen`] in user units once the current scale
//! is known.

use crate::backend::DrawContext;
use kurbo::BezPath;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// A stroke fully resolved to user units, ready for a draw context.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePen {
    pub width: f64,
    /// Alternating on/off lengths in user units. Empty means solid.
    pub dash: Vec<f64>,
    pub dash_offset: f64,
    pub cap: LineCap,
    pub join: LineJoin,
}

/// Style properties shared by all shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color (None = no stroke).
    pub line_color: Option<SerializableColor>,
    /// Stroke width, in user units or pixels per `width_in_pixels`.
    pub line_width: f64,
    /// Line width is in device pixels rather than user units.
    #[serde(default)]
    pub width_in_pixels: bool,
    /// Alternating on/off dash lengths. Empty means solid.
    #[serde(default)]
    pub dash: Vec<f64>,
    /// Dash lengths are in device pixels rather than user units.
    #[serde(default)]
    pub dash_in_pixels: bool,
    /// Offset into the dash pattern, in the same units as `dash`.
    #[serde(default)]
    pub dash_offset: f64,
    /// Color drawn in the gaps between dashes (None = gaps transparent).
    #[serde(default)]
    pub dash_color: Option<SerializableColor>,
    #[serde(default)]
    pub cap: LineCap,
    #[serde(default)]
    pub join: LineJoin,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            line_color: Some(SerializableColor::black()),
            line_width: 1.0,
            width_in_pixels: false,
            dash: Vec::new(),
            dash_in_pixels: false,
            dash_offset: 0.0,
            dash_color: None,
            cap: LineCap::default(),
            join: LineJoin::default(),
            fill_color: None,
        }
    }
}

impl ShapeStyle {
    /// True when the perimeter is drawn at all.
    pub fn lined(&self) -> bool {
        self.line_color.is_some() && self.line_width > 0.0
    }

    pub fn filled(&self) -> bool {
        self.fill_color.is_some()
    }

    pub fn line(&self) -> Option<Color> {
        self.line_color.map(Into::into)
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(Into::into)
    }

    pub fn set_line(&mut self, color: Option<Color>) {
        self.line_color = color.map(Into::into);
    }

    pub fn set_fill(&mut self, color: Option<Color>) {
        self.fill_color = color.map(Into::into);
    }

    /// Set the line width in user units.
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
        self.width_in_pixels = false;
    }

    /// Set the line width in device pixels. The stroke then keeps its
    /// on-screen thickness when the canvas is zoomed.
    pub fn set_line_width_in_pixels(&mut self, width: f64) {
        self.line_width = width;
        self.width_in_pixels = true;
    }

    pub fn set_dash(&mut self, dash: Vec<f64>, offset: f64) {
        self.dash = dash;
        self.dash_offset = offset;
        self.dash_in_pixels = false;
    }

    pub fn set_dash_in_pixels(&mut self, dash: Vec<f64>, offset: f64) {
        self.dash = dash;
        self.dash_offset = offset;
        self.dash_in_pixels = true;
    }

    /// Line width in user units at the given scale. `upp` is user units
    /// per device pixel (1/ppu).
    pub fn line_width_user(&self, upp: f64) -> f64 {
        if self.width_in_pixels {
            self.line_width * upp
        } else {
            self.line_width
        }
    }

    /// Resolve to a pen with all lengths in user units.
    pub fn resolve_pen(&self, upp: f64) -> StrokePen {
        let dash_scale = if self.dash_in_pixels { upp } else { 1.0 };
        StrokePen {
            width: self.line_width_user(upp),
            dash: self.dash.iter().map(|d| d * dash_scale).collect(),
            dash_offset: self.dash_offset * dash_scale,
            cap: self.cap,
            join: self.join,
        }
    }

    /// Stroke a path with this style, honoring dashes and the dash-gap
    /// color. The gap color is painted with the complementary dash
    /// pattern underneath the dashes themselves.
    pub fn stroke_path(&self, ctx: &mut dyn DrawContext, path: &BezPath) {
        let Some(line) = self.line() else {
            return;
        };
        if self.line_width <= 0.0 {
            return;
        }
        let pen = self.resolve_pen(ctx.user_per_pixel());
        if !pen.dash.is_empty() {
            if let Some(gap) = self.dash_color {
                let mut gap_pen = pen.clone();
                // Complement of the pattern: rotate it left by one slot
                // and advance the offset past the first on-length.
                gap_pen.dash.rotate_left(1);
                gap_pen.dash_offset += pen.dash[0];
                ctx.stroke_path(path, &gap_pen, gap.into());
            }
        }
        ctx.stroke_path(path, &pen, line);
    }

    /// Fill then stroke a path, the usual paint order for closed shapes
    /// whose perimeter is centered on the path.
    pub fn fill_and_stroke(&self, ctx: &mut dyn DrawContext, path: &BezPath) {
        if let Some(fill) = self.fill() {
            ctx.fill_path(path, fill);
        }
        self.stroke_path(ctx, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_round_trip() {
        let c = SerializableColor::new(12, 34, 56, 200);
        let peniko: Color = c.into();
        let back: SerializableColor = peniko.into();
        assert_eq!(c, back);
    }

    #[test]
    fn test_line_width_units() {
        let mut style = ShapeStyle::default();
        style.set_line_width(2.0);
        assert!((style.line_width_user(0.1) - 2.0).abs() < f64::EPSILON);
        style.set_line_width_in_pixels(2.0);
        // 2 pixels at 10 pixels per unit is 0.2 user units
        assert!((style.line_width_user(0.1) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_pen_dash_units() {
        let mut style = ShapeStyle::default();
        style.set_dash_in_pixels(vec![4.0, 2.0], 1.0);
        let pen = style.resolve_pen(0.5);
        assert_eq!(pen.dash, vec![2.0, 1.0]);
        assert!((pen.dash_offset - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_style_serde_round_trip() {
        let mut style = ShapeStyle::default();
        style.set_line_width_in_pixels(2.5);
        style.set_dash(vec![3.0, 1.0], 0.5);
        style.dash_color = Some(SerializableColor::white());
        let json = serde_json::to_string(&style).unwrap();
        let back: ShapeStyle = serde_json::from_str(&json).unwrap();
        assert!(back.width_in_pixels);
        assert_eq!(back.dash, vec![3.0, 1.0]);
        assert_eq!(back.dash_color, Some(SerializableColor::white()));
    }

    #[test]
    fn test_lined_and_filled() {
        let mut style = ShapeStyle::default();
        assert!(style.lined());
        assert!(!style.filled());
        style.set_line(None);
        style.set_fill(Some(Color::from_rgba8(255, 0, 0, 255)));
        assert!(!style.lined());
        assert!(style.filled());
    }
}
