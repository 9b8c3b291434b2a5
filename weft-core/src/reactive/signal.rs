//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which owners read it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an active owner is on top of the context
//!    stack, the owner is added to the signal's observer set (once), and a
//!    cleanup is registered on the owner that removes it again.
//!
//! 2. When a signal is written, the observer set is swapped for an empty one
//!    and every previously registered observer that is still active is
//!    executed, in subscription order.
//!
//! 3. Executing an owner cleans it first, which runs the removal cleanups,
//!    and then re-runs its body, which subscribes it again to whatever it
//!    reads this time. Dependencies that are no longer read simply never come
//!    back.
//!
//! Owners that subscribe while a notification pass is in flight land in the
//! fresh set and are notified by the next write, not the current one.
//!
//! # Writes During Reads
//!
//! `with`, `with_untracked` and `update` lend the value to a closure. A write
//! to the same signal that happens while the value is lent (directly, or from
//! an effect the closure triggers) is deferred: it is stored and applied, with
//! its notification, as soon as the last borrow is released. If several such
//! writes pile up, the last one wins.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID
//! - The value, behind a `RefCell`
//! - An insertion-ordered map of observer IDs to owner handles
//! - An optional equality comparator
//! - A slot for a write deferred while the value is borrowed

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context;
use super::id::{OwnerId, SignalId};
use super::owner::Owner;

/// Comparator deciding whether a write leaves the value unchanged.
pub type Equals<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Options for [`create_signal_with_options`].
pub struct SignalOptions<T> {
    /// When set and returning `true` for `(old, new)`, a write stores the new
    /// value without notifying observers.
    pub equals: Option<Equals<T>>,
}

impl<T> SignalOptions<T> {
    /// Options with the given comparator.
    pub fn with_equals(equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            equals: Some(Rc::new(equals)),
        }
    }
}

impl<T: PartialEq> SignalOptions<T> {
    /// Options that skip notification when the new value is `==` the old one.
    pub fn partial_eq() -> Self {
        Self::with_equals(|a: &T, b: &T| a == b)
    }
}

impl<T> Default for SignalOptions<T> {
    fn default() -> Self {
        Self { equals: None }
    }
}

struct SignalInner<T> {
    id: SignalId,
    value: RefCell<T>,
    observers: RefCell<IndexMap<OwnerId, Owner>>,
    equals: Option<Equals<T>>,
    deferred: RefCell<Option<T>>,
}

impl<T: 'static> SignalInner<T> {
    /// Subscribe the active owner, if there is one.
    fn track(self: &Rc<Self>) {
        let Some(owner) = context::get_owner() else {
            return;
        };
        if !owner.is_active() {
            return;
        }

        let id = owner.id();
        {
            let mut observers = self.observers.borrow_mut();
            if observers.contains_key(&id) {
                return;
            }
            observers.insert(id, owner.clone());
        }

        let signal = Rc::downgrade(self);
        owner.push_cleanup(Box::new(move || {
            if let Some(signal) = signal.upgrade() {
                signal.observers.borrow_mut().shift_remove(&id);
            }
        }));
    }

    /// Lend the value to `f`, then apply any write deferred meanwhile.
    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let result = {
            let value = self.value.borrow();
            f(&*value)
        };
        self.apply_deferred();
        result
    }

    fn write(&self, value: T) {
        if self.value.try_borrow_mut().is_err() {
            tracing::trace!(signal = %self.id, "value is borrowed, deferring write");
            *self.deferred.borrow_mut() = Some(value);
            return;
        }

        let unchanged = match &self.equals {
            Some(equals) => {
                let current = self.value.borrow();
                equals(&*current, &value)
            }
            None => false,
        };
        drop(self.value.replace(value));

        if !unchanged {
            self.notify();
        }
    }

    fn apply_deferred(&self) {
        // Still lent to an outer reader; that one applies it.
        let free = self.value.try_borrow_mut().is_ok();
        if !free {
            return;
        }
        let deferred = self.deferred.borrow_mut().take();
        if let Some(value) = deferred {
            self.write(value);
        }
    }

    fn notify(&self) {
        let observers = std::mem::take(&mut *self.observers.borrow_mut());
        tracing::trace!(signal = %self.id, observers = observers.len(), "notifying observers");

        for owner in observers.into_values() {
            if owner.is_active() {
                owner.execute();
            }
        }
    }
}

/// The read half of a signal.
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

/// The write half of a signal.
pub struct WriteSignal<T> {
    inner: Rc<SignalInner<T>>,
}

/// Create a signal holding `initial`.
///
/// Every write notifies observers.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::{create_root, create_effect, create_signal};
///
/// let (count, set_count) = create_signal(0);
///
/// create_root(|_| {
///     create_effect(move || println!("count = {}", count.get()));
/// });
///
/// set_count.set(1);
/// set_count.update(|v| v + 1);
/// ```
pub fn create_signal<T: 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    create_signal_with_options(initial, SignalOptions::default())
}

/// Create a signal with an optional equality comparator.
pub fn create_signal_with_options<T: 'static>(
    initial: T,
    options: SignalOptions<T>,
) -> (ReadSignal<T>, WriteSignal<T>) {
    let inner = Rc::new(SignalInner {
        id: SignalId::next(),
        value: RefCell::new(initial),
        observers: RefCell::new(IndexMap::new()),
        equals: options.equals,
        deferred: RefCell::new(None),
    });
    (
        ReadSignal {
            inner: Rc::clone(&inner),
        },
        WriteSignal { inner },
    )
}

impl<T: 'static> ReadSignal<T> {
    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Get a clone of the current value, subscribing the active owner.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrow the current value, subscribing the active owner.
    ///
    /// Writes to this signal made while `f` runs are applied after it returns.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.track();
        self.inner.read(f)
    }

    /// Get a clone of the current value without subscribing anyone.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    /// Borrow the current value without subscribing anyone.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.read(f)
    }

    /// Number of owners currently subscribed.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }
}

impl<T: 'static> WriteSignal<T> {
    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Store `value` and notify observers.
    ///
    /// If the signal has a comparator that reports the value unchanged, the
    /// value is still stored but nobody is notified. While the value is lent
    /// to a reader the write is deferred until the reader returns.
    pub fn set(&self, value: T) {
        self.inner.write(value);
    }

    /// Compute the new value from the current one, then [`set`](Self::set) it.
    ///
    /// A write made from inside `f` lands first and is then overwritten.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.inner.read(f);
        self.inner.write(next);
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("observer_count", &self.inner.observers.borrow().len())
            .finish()
    }
}

impl<T> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
