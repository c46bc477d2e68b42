//! Main-thread bookkeeping.
//!
//! On-screen drawing must happen on the thread that owns the windowing
//! system. The application registers that thread once at startup; debug
//! builds then assert it on the on-screen entry points. Nothing is
//! enforced if no thread was ever registered, so off-screen use needs no
//! setup.

use std::sync::OnceLock;
use std::thread::{self, ThreadId};

static MAIN_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Record the current thread as the main thread. Later calls are
/// ignored.
pub fn set_main_thread() {
    let _ = MAIN_THREAD.set(thread::current().id());
}

/// True if no main thread was registered or the current thread is it.
pub fn is_main_thread() -> bool {
    match MAIN_THREAD.get() {
        Some(id) => *id == thread::current().id(),
        None => true,
    }
}

/// Debug assertion that we are on the registered main thread.
pub fn require_main_thread() {
    debug_assert!(is_main_thread(), "called off the main thread");
}
