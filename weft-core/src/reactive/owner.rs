//! Ownership Tree
//!
//! Every tracked computation runs inside an [`Owner`]. Owners form a tree:
//! an owner owns the child owners created while it runs and the cleanup
//! callbacks registered while it runs. Disposing an owner tears all of that
//! down, recursively and immediately.
//!
//! # Owner Kinds
//!
//! There are two kinds of owner:
//!
//! - **Roots**, created by [`create_root`]. A root has no parent, is never
//!   active and is never executed. It exists only to own a subtree and is torn
//!   down through its [`Disposer`]. A root created while another root is
//!   running is *not* its child.
//!
//! - **Children**, created by [`create_child_context`] (and therefore by every
//!   effect, memo and render effect). A child has exactly one parent, the owner
//!   that was active when it was created, and a computation that
//!   [`Owner::execute`] re-runs.
//!
//! # Lifecycle
//!
//! ```text
//! created (active) -> executing -> idle (active) -> ... -> disposed (inactive)
//! ```
//!
//! Each `execute` first cleans the owner without deactivating it: children
//! are disposed, cleanups run, both lists are cleared. Then the computation
//! runs again with the owner on top of the context stack, so whatever it reads
//! and creates this time is attributed afresh. Deactivation is terminal.
//!
//! # Re-entrant Execution
//!
//! A body may write a signal it has already read, so the owner is notified
//! while it is still running. That nested `execute` does not run anything; it
//! marks the owner pending. When the current run returns, a pending owner is
//! cleaned and run again, until a run finishes without re-triggering itself.
//! An owner that is still re-triggering after [`MAX_PASSES`] runs is reported
//! as [`ReactiveError::ReentrantExecution`] and left as it is.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::context::{self, ContextGuard};
use super::error::ReactiveError;
use super::id::OwnerId;
use super::runtime;

/// Runs one `execute` may perform before a self-triggering owner is given up on.
pub(crate) const MAX_PASSES: usize = 100;

/// A body that an owner re-runs on [`Owner::execute`].
///
/// Implementations keep whatever state a run needs between executions (a
/// previous result, a remembered node) behind interior mutability.
pub(crate) trait Computation {
    fn run(&self);
}

/// Plain `FnMut()` bodies.
impl<F> Computation for RefCell<F>
where
    F: FnMut(),
{
    fn run(&self) {
        let mut body = self.borrow_mut();
        (*body)()
    }
}

/// Which kind of owner this is.
#[derive(Debug, Clone)]
enum OwnerKind {
    Root,
    Child { parent: Weak<OwnerNode> },
}

struct OwnerNode {
    id: OwnerId,
    kind: OwnerKind,
    active: Cell<bool>,
    running: Cell<bool>,
    pending: Cell<bool>,
    children: RefCell<SmallVec<[Owner; 4]>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    computation: RefCell<Option<Rc<dyn Computation>>>,
}

/// Handle to a tracking context in the ownership tree.
///
/// Cloning the handle shares the owner. Parents hold their children and
/// signals hold their observers; a child only points weakly at its parent.
/// Disposal unsubscribes an owner everywhere, which releases it.
#[derive(Clone)]
pub struct Owner {
    inner: Rc<OwnerNode>,
}

impl Owner {
    fn new(kind: OwnerKind, active: bool) -> Self {
        Self {
            inner: Rc::new(OwnerNode {
                id: OwnerId::next(),
                kind,
                active: Cell::new(active),
                running: Cell::new(false),
                pending: Cell::new(false),
                children: RefCell::new(SmallVec::new()),
                cleanups: RefCell::new(Vec::new()),
                computation: RefCell::new(None),
            }),
        }
    }

    /// Allocate a child of the active owner without a computation.
    ///
    /// With no active owner this reports a usage error and returns a detached
    /// child that nobody will ever dispose.
    pub(crate) fn new_child(operation: &'static str) -> Self {
        match context::get_owner() {
            Some(parent) => {
                let child = Self::new(
                    OwnerKind::Child {
                        parent: Rc::downgrade(&parent.inner),
                    },
                    true,
                );
                parent.inner.children.borrow_mut().push(child.clone());
                child
            }
            None => {
                runtime::report(ReactiveError::NoOwner { operation });
                Self::new(OwnerKind::Child { parent: Weak::new() }, true)
            }
        }
    }

    pub(crate) fn set_computation(&self, computation: Rc<dyn Computation>) {
        *self.inner.computation.borrow_mut() = Some(computation);
    }

    pub(crate) fn push_cleanup(&self, cleanup: Box<dyn FnOnce()>) {
        self.inner.cleanups.borrow_mut().push(cleanup);
    }

    /// Run `body` with this owner on top of the context stack, outside of the
    /// execute cycle. Used for the first run of computations that need their
    /// output before the computation object can be built.
    ///
    /// The owner counts as running, so a write to something `body` read only
    /// marks it pending. Call [`settle`](Self::settle) once the computation is
    /// attached.
    pub(crate) fn run_tracked<R>(&self, body: impl FnOnce() -> R) -> R {
        let _running = RunningGuard::enter(&self.inner.running);
        let _guard = ContextGuard::enter(Some(self));
        body()
    }

    /// Re-run the owner if it was notified during [`run_tracked`](Self::run_tracked).
    pub(crate) fn settle(&self) {
        if self.inner.pending.replace(false) {
            self.execute();
        }
    }

    /// Get the owner's unique ID.
    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    /// Whether the owner can still be executed and subscribed.
    ///
    /// Roots are never active; children become inactive once disposed.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Whether this owner was created by [`create_root`].
    pub fn is_root(&self) -> bool {
        matches!(self.inner.kind, OwnerKind::Root)
    }

    /// The owner this child was created under, if it is still alive.
    pub fn parent(&self) -> Option<Owner> {
        match &self.inner.kind {
            OwnerKind::Root => None,
            OwnerKind::Child { parent } => parent.upgrade().map(|inner| Owner { inner }),
        }
    }

    /// Number of child owners created since the last cleanup.
    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Number of cleanup callbacks registered since the last cleanup.
    pub fn cleanup_count(&self) -> usize {
        self.inner.cleanups.borrow().len()
    }

    /// Re-run the owner's computation.
    ///
    /// Cleans the owner (without deactivating it) and then runs the
    /// computation with the owner active. Inactive owners are skipped, and
    /// executing a root is a usage error.
    ///
    /// Executing an owner whose body is running marks it pending instead; the
    /// running `execute` runs it again once the current run returns.
    pub fn execute(&self) {
        if self.is_root() {
            runtime::report(ReactiveError::RootExecuted(self.id()));
            return;
        }
        if !self.is_active() {
            return;
        }
        if self.inner.running.get() {
            tracing::trace!(owner = %self.id(), "owner notified while running, re-run pending");
            self.inner.pending.set(true);
            return;
        }

        let _running = RunningGuard::enter(&self.inner.running);
        let mut passes = 0;
        loop {
            passes += 1;
            self.inner.pending.set(false);

            tracing::trace!(owner = %self.id(), passes, "executing owner");
            cleanup(self, false);

            let computation = self.inner.computation.borrow().clone();
            let Some(computation) = computation else {
                break;
            };
            {
                let _guard = ContextGuard::enter(Some(self));
                computation.run();
            }

            if !self.inner.pending.get() || !self.is_active() {
                break;
            }
            if passes == MAX_PASSES {
                self.inner.pending.set(false);
                runtime::report(ReactiveError::ReentrantExecution(self.id()));
                break;
            }
        }
    }

    /// Dispose the owner: clean it and deactivate it for good.
    pub fn dispose(&self) {
        cleanup(self, true);
    }
}

/// Marks an owner as running until dropped.
struct RunningGuard<'a>(&'a Cell<bool>);

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Owner {}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id())
            .field("root", &self.is_root())
            .field("active", &self.is_active())
            .field("child_count", &self.child_count())
            .field("cleanup_count", &self.cleanup_count())
            .finish()
    }
}

/// Clean an owner.
///
/// Every child is disposed (recursively, always deactivated), then every
/// cleanup callback runs in registration order, and both lists are cleared.
/// The owner itself is deactivated only when `dispose` is true.
///
/// Runs untracked, so signals read from cleanup callbacks never subscribe the
/// owner being torn down.
pub fn cleanup(owner: &Owner, dispose: bool) {
    tracing::trace!(owner = %owner.id(), dispose, "cleaning owner");

    context::untrack(|| {
        let children = std::mem::take(&mut *owner.inner.children.borrow_mut());
        for child in children {
            cleanup(&child, true);
        }

        let cleanups = std::mem::take(&mut *owner.inner.cleanups.borrow_mut());
        for callback in cleanups {
            callback();
        }
    });

    if dispose {
        owner.inner.active.set(false);
        // The body will never run again; release what it captured.
        owner.inner.computation.borrow_mut().take();
    }
}

/// Allocate a child owner of the active owner that re-runs `body` on every
/// [`Owner::execute`].
///
/// The body is not run here. Without an active owner a usage error is
/// reported and the returned owner is detached.
pub fn create_child_context(body: impl FnMut() + 'static) -> Owner {
    let owner = Owner::new_child("create_child_context");
    owner.set_computation(Rc::new(RefCell::new(body)));
    owner
}

/// Handle that disposes a root owner.
#[derive(Clone, Debug)]
pub struct Disposer {
    root: Owner,
}

impl Disposer {
    /// Dispose everything the root owns.
    pub fn dispose(&self) {
        self.root.dispose();
    }

    /// The root owner this handle disposes.
    pub fn owner(&self) -> &Owner {
        &self.root
    }
}

/// Create an independent root owner and run `body` inside it.
///
/// The root has no parent, even when created while another owner is running,
/// so it is only torn down through the [`Disposer`] handed to `body`.
pub fn create_root<R>(body: impl FnOnce(Disposer) -> R) -> R {
    let root = Owner::new(OwnerKind::Root, false);
    let disposer = Disposer { root: root.clone() };
    let _guard = ContextGuard::enter(Some(&root));
    body(disposer)
}

/// Register `callback` to run when the active owner is next cleaned.
///
/// Without an active owner a usage error is reported and the callback is
/// dropped.
pub fn on_cleanup(callback: impl FnOnce() + 'static) {
    match context::get_owner() {
        Some(owner) => owner.push_cleanup(Box::new(callback)),
        None => runtime::report(ReactiveError::NoOwner {
            operation: "on_cleanup",
        }),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
