//! Reactive Runtime
//!
//! Per-thread bookkeeping that sits beside the context stack:
//!
//! - the diagnostic channel that usage errors are reported through;
//! - the mount queue behind [`on_mount`].
//!
//! # Mount Queue
//!
//! `on_mount` callbacks must run after the current synchronous work unwinds.
//! There is no event loop here, so "unwinds" means the context stack drops
//! back to empty: the last [`ContextGuard`](super::context::ContextGuard) to
//! pop flushes the queue in FIFO order, each callback untracked. Callbacks
//! queued while flushing join the same flush.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::context::{self, ContextGuard};
use super::error::ReactiveError;

thread_local! {
    static DIAGNOSTICS: RefCell<Vec<ReactiveError>> = const { RefCell::new(Vec::new()) };
    static MOUNT_QUEUE: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
}

/// Report a usage error.
///
/// Emits a `tracing` warning and records the error in this thread's
/// diagnostic log. Never panics.
pub(crate) fn report(error: ReactiveError) {
    tracing::warn!(target: "weft_core::diagnostics", %error, "reactive usage error");
    DIAGNOSTICS.with(|log| log.borrow_mut().push(error));
}

/// Drain the usage errors reported on this thread so far.
pub fn take_diagnostics() -> Vec<ReactiveError> {
    DIAGNOSTICS.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

/// Schedule `body` to run once, untracked, after the current synchronous work
/// unwinds.
///
/// Called while nothing is running, `body` runs right away.
pub fn on_mount(body: impl FnOnce() + 'static) {
    MOUNT_QUEUE.with(|queue| queue.borrow_mut().push_back(Box::new(body)));
    if context::is_idle() {
        flush_mounts();
    }
}

/// Run every queued mount callback.
pub(crate) fn flush_mounts() {
    if FLUSHING.with(|flag| flag.replace(true)) {
        return;
    }

    struct ResetFlag;
    impl Drop for ResetFlag {
        fn drop(&mut self) {
            FLUSHING.with(|flag| flag.set(false));
        }
    }
    let _reset = ResetFlag;

    while let Some(body) = MOUNT_QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
        let _guard = ContextGuard::enter(None);
        body();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
