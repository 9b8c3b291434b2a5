//! Memo Implementation
//!
//! A Memo is a derived value that only notifies its readers when the value
//! actually changes.
//!
//! # How Memos Work
//!
//! A memo is an effect that publishes into a private signal:
//!
//! 1. On creation, the body runs once inside the memo's own owner (tracking
//!    its dependencies) and the result seeds the signal.
//!
//! 2. When a dependency is written, the memo's owner re-runs the body with the
//!    last published value.
//!
//! 3. The new result is compared with the last published one. Only when they
//!    differ is it written into the signal, which is what re-runs the memo's
//!    own readers.
//!
//! # Why This Matters
//!
//! Without a memo, N writes to a signal re-run every reader N times. Reading
//! through a memo whose result did not change leaves the readers alone even
//! though the memo's body re-ran.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::owner::{Computation, Owner};
use super::signal::{create_signal, Equals, ReadSignal, WriteSignal};

/// Options for [`create_memo_with_options`].
pub struct MemoOptions<T> {
    /// Returns `true` when `(previous, next)` should count as unchanged.
    /// With no comparator every re-run publishes.
    pub equals: Option<Equals<T>>,
}

impl<T> MemoOptions<T> {
    /// Options with the given comparator.
    pub fn with_equals(equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            equals: Some(Rc::new(equals)),
        }
    }
}

impl<T: PartialEq> Default for MemoOptions<T> {
    fn default() -> Self {
        Self::with_equals(|a: &T, b: &T| a == b)
    }
}

/// A derived value that re-notifies its readers only on change.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::{create_memo, create_root, create_signal};
///
/// let (count, set_count) = create_signal(3);
///
/// let parity = create_root(|_| create_memo(move |_| count.get() % 2 == 0));
/// assert!(!parity.get());
///
/// set_count.set(5); // body re-runs, parity unchanged, readers stay put
/// set_count.set(6);
/// assert!(parity.get());
/// ```
pub struct Memo<T> {
    value: ReadSignal<T>,
    owner: Owner,
}

struct MemoComputation<T, F> {
    body: RefCell<F>,
    read: ReadSignal<T>,
    write: WriteSignal<T>,
    equals: Option<Equals<T>>,
}

impl<T, F> Computation for MemoComputation<T, F>
where
    T: 'static,
    F: FnMut(Option<&T>) -> T,
{
    fn run(&self) {
        let (next, unchanged) = self.read.with_untracked(|previous| {
            let next = {
                let mut body = self.body.borrow_mut();
                (*body)(Some(previous))
            };
            let unchanged = match &self.equals {
                Some(equals) => equals(previous, &next),
                None => false,
            };
            (next, unchanged)
        });

        if !unchanged {
            self.write.set(next);
        }
    }
}

/// Create a memo under the active owner, deduplicating with `PartialEq`.
///
/// The body receives the last published value (`None` on the first run).
pub fn create_memo<T>(body: impl FnMut(Option<&T>) -> T + 'static) -> Memo<T>
where
    T: PartialEq + 'static,
{
    create_memo_with_options(body, MemoOptions::default())
}

/// Create a memo with an explicit comparator.
pub fn create_memo_with_options<T>(
    body: impl FnMut(Option<&T>) -> T + 'static,
    options: MemoOptions<T>,
) -> Memo<T>
where
    T: 'static,
{
    let mut body = body;
    let owner = Owner::new_child("create_memo");
    let initial = owner.run_tracked(|| body(None));
    let (read, write) = create_signal(initial);

    owner.set_computation(Rc::new(MemoComputation {
        body: RefCell::new(body),
        read: read.clone(),
        write,
        equals: options.equals,
    }));
    owner.settle();

    Memo { value: read, owner }
}

impl<T: 'static> Memo<T> {
    /// Get the current value, subscribing the active owner.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.get()
    }

    /// Borrow the current value, subscribing the active owner.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// Get the current value without subscribing anyone.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.value.get_untracked()
    }

    /// The read-only signal the memo publishes into.
    pub fn signal(&self) -> &ReadSignal<T> {
        &self.value
    }

    /// The owner the memo's body runs in.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Stop recomputing. The last published value stays readable.
    pub fn dispose(&self) {
        self.owner.dispose();
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl<T: Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("owner", &self.owner.id())
            .field("value", &self.value)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
