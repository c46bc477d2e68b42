//! Inbound events from the embedding application.
//!
//! The canvas has no windowing dependency; the application forwards
//! resize and pointer events as plain data, in device pixels, and the
//! canvas hands back user coordinates. Motion events are dropped unless
//! tracking is enabled, since most applications only care about them
//! while dragging.

use crate::backend::Backend;
use crate::canvas::Canvas;
use crate::geometry::{PixelPoint, PixelSize};
use crate::mainthread;
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Position in device pixels.
    pub pos: PixelPoint,
    pub button: u8,
    pub shift: bool,
    pub ctrl: bool,
}

impl<B: Backend> Canvas<B> {
    /// Window size as last reported by `on_resize`.
    pub fn window_size(&self) -> PixelSize {
        self.window_size
    }

    /// Handle a window resize: record the new size and refit the scale
    /// so the content fills the window.
    pub fn on_resize(&mut self, size: PixelSize) {
        mainthread::require_main_thread();
        self.window_size = size;
        self.zoom_to_fill(size);
        self.request_draw();
    }

    /// Enable or disable delivery of `Move` events. Typically switched
    /// on while a rubber band is active.
    pub fn set_track_motion(&mut self, track: bool) {
        self.track_motion = track;
    }

    pub fn track_motion(&self) -> bool {
        self.track_motion
    }

    /// Translate a pointer event to user coordinates, or `None` for a
    /// motion event while motion tracking is off.
    pub fn map_pointer(&self, event: &PointerEvent) -> Option<(PointerKind, Point)> {
        if event.kind == PointerKind::Move && !self.track_motion {
            return None;
        }
        Some((event.kind, self.pixel_to_user(event.pos)))
    }

    /// Dispatch a pointer event to a handler with the position already
    /// converted to user coordinates. Gated motion events are dropped
    /// without calling the handler.
    pub fn on_pointer<F>(&mut self, event: &PointerEvent, handler: F)
    where
        F: FnOnce(&mut Self, PointerKind, Point, &PointerEvent),
    {
        if let Some((kind, pos)) = self.map_pointer(event) {
            handler(self, kind, pos, event);
        }
    }

    /// Ask the embedding application for a repaint. The flag is sticky
    /// until collected with `take_draw_request`.
    pub fn request_draw(&mut self) {
        self.draw_requested = true;
    }

    pub fn take_draw_request(&mut self) -> bool {
        std::mem::take(&mut self.draw_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Circle;
    use crate::testutil::FakeBackend;
    use peniko::Color;

    fn canvas_with_content() -> Canvas<FakeBackend> {
        let mut canvas = Canvas::new(FakeBackend::default());
        canvas.set_margin(0.0);
        let layer = canvas.new_layer("main");
        let mut circle = Circle::new(Point::new(5.0, 5.0), 5.0);
        circle.style.set_fill(Some(Color::from_rgba8(0, 0, 0, 255)));
        layer.add_item(circle);
        canvas
    }

    #[test]
    fn test_motion_gated_by_tracking() {
        let mut canvas = canvas_with_content();
        canvas.set_transform(10.0);
        let event = PointerEvent {
            kind: PointerKind::Move,
            pos: PixelPoint::new(50, 50),
            button: 0,
            shift: false,
            ctrl: false,
        };
        assert!(canvas.map_pointer(&event).is_none());
        canvas.set_track_motion(true);
        assert!(canvas.map_pointer(&event).is_some());
    }

    #[test]
    fn test_pointer_converted_to_user_coords() {
        let mut canvas = canvas_with_content();
        canvas.set_transform(10.0);
        let event = PointerEvent {
            kind: PointerKind::Down,
            pos: PixelPoint::new(25, 25),
            button: 1,
            shift: false,
            ctrl: false,
        };
        let mut seen = None;
        canvas.on_pointer(&event, |_, kind, pos, ev| {
            seen = Some((kind, pos, ev.button));
        });
        let (kind, pos, button) = seen.unwrap();
        assert_eq!(kind, PointerKind::Down);
        assert_eq!(button, 1);
        assert!((pos.x - 2.5).abs() < 1e-9);
        assert!((pos.y - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_resize_refits_and_requests_draw() {
        let mut canvas = canvas_with_content();
        canvas.on_resize(PixelSize::new(500, 400));
        assert_eq!(canvas.window_size(), PixelSize::new(500, 400));
        // 10 user units into 400 pixels vertically.
        assert!((canvas.ppu() - 40.0).abs() < 1e-9);
        assert!(canvas.take_draw_request());
        assert!(!canvas.take_draw_request());
    }
}
