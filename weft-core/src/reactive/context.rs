//! Context Stack
//!
//! The context stack tracks which owner is currently running. Signal reads,
//! cleanup registrations and child creation are all attributed to the owner
//! on top of the stack.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a context (running an effect body,
//! re-entering a captured owner, running a root) pushes an entry; dropping the
//! returned [`ContextGuard`] pops it. Because the pop lives in `Drop`, it
//! happens on early returns and while unwinding from a panicking body.
//!
//! An entry is either an owner or the untracked marker. Under the marker
//! nothing is attributed to anyone: signal reads subscribe nobody and
//! [`get_owner`] returns `None`.
//!
//! Every thread has its own stack, so independent graphs built on different
//! threads (for example, parallel tests) never see each other's owners.

use std::cell::RefCell;

use super::owner::Owner;
use super::runtime;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the context stack.
#[derive(Clone)]
enum ContextEntry {
    /// Reads and registrations are attributed to this owner.
    Owner(Owner),
    /// Nothing is attributed.
    Untracked,
}

/// Guard that pops the context when dropped.
pub(crate) struct ContextGuard {
    depth: usize,
}

impl ContextGuard {
    /// Push `owner` (or the untracked marker for `None`).
    pub(crate) fn enter(owner: Option<&Owner>) -> Self {
        let entry = match owner {
            Some(owner) => ContextEntry::Owner(owner.clone()),
            None => ContextEntry::Untracked,
        };
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(entry);
            stack.len()
        });
        Self { depth }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let remaining = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "context stack mismatch: guard expected depth {}, found {}",
                self.depth,
                stack.len()
            );
            stack.pop();
            stack.len()
        });

        if remaining == 0 && !std::thread::panicking() {
            runtime::flush_mounts();
        }
    }
}

/// Whether the context stack is empty.
pub(crate) fn is_idle() -> bool {
    CONTEXT_STACK.with(|stack| stack.borrow().is_empty())
}

/// Get the owner on top of the context stack.
///
/// Returns `None` when nothing is running or when the top entry is the
/// untracked marker.
pub fn get_owner() -> Option<Owner> {
    CONTEXT_STACK.with(|stack| match stack.borrow().last() {
        Some(ContextEntry::Owner(owner)) => Some(owner.clone()),
        Some(ContextEntry::Untracked) | None => None,
    })
}

/// Run `body` with `owner` as the active context, or untracked for `None`.
///
/// This is the plain forwarding mode: `body` receives nothing. The context is
/// popped on every exit path.
pub fn run_in_context<R>(owner: Option<&Owner>, body: impl FnOnce() -> R) -> R {
    let _guard = ContextGuard::enter(owner);
    body()
}

/// Run `body` without attributing anything to the current owner.
///
/// Signal reads inside `body` register no observer.
pub fn untrack<R>(body: impl FnOnce() -> R) -> R {
    run_in_context(None, body)
}

/// Re-enter a captured owner from outside its original call stack.
///
/// The owner's stored computation state is left untouched; this only changes
/// attribution while `body` runs.
pub fn run_with_owner<R>(owner: &Owner, body: impl FnOnce() -> R) -> R {
    run_in_context(Some(owner), body)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
