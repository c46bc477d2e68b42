//! Coarse-grained sharing of a canvas between threads.
//!
//! The canvas itself is single-writer: one mutation at a time, no
//! internal locking. When an application wants to drive it from more
//! than one thread (a worker producing items while the UI thread draws),
//! it wraps the canvas here and every access goes through the one mutex.
//! The lock serializes access; it does not make concurrent drawing fast.

use crate::backend::Backend;
use crate::canvas::Canvas;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SharedCanvas<B: Backend> {
    inner: Arc<Mutex<Canvas<B>>>,
}

impl<B: Backend> Clone for SharedCanvas<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> SharedCanvas<B> {
    pub fn new(canvas: Canvas<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(canvas)),
        }
    }

    /// Lock the canvas for a sequence of operations. A thread that
    /// panicked while holding the lock leaves the canvas in a usable
    /// state (nothing is half-applied across a public call), so poison
    /// is cleared rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, Canvas<B>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run a closure with the canvas locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Canvas<B>) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::Circle;
    use crate::testutil::FakeBackend;
    use kurbo::Point;

    #[test]
    fn test_shared_access() {
        let shared = SharedCanvas::new(Canvas::new(FakeBackend::default()));
        let clone = shared.clone();
        shared.with(|canvas| {
            canvas
                .new_layer("main")
                .add_item(Circle::new(Point::new(0.0, 0.0), 1.0));
        });
        assert_eq!(clone.lock().n_visible_items(), 1);
    }
}
