//! Render Effects
//!
//! A render effect is an effect whose result is a node. It owns the node it
//! produced last; when a dependency changes, the body re-runs, the result is
//! materialized into a fresh node, and the fresh node takes the old one's
//! place in whatever parent the old one has *now*.
//!
//! # Replacement Protocol
//!
//! 1. The body runs inside the render effect's owner (tracked).
//! 2. The result is materialized with [`materialize`].
//! 3. If the fresh node is the remembered one (a body passing the same node
//!    through), nothing moves.
//! 4. Otherwise the remembered node's live parent is looked up. When it has
//!    one, [`Host::replace_child`] swaps the nodes in place; when it is not
//!    attached yet, only the remembered node changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::reactive::{create_root, on_cleanup, Computation, Disposer, Owner};

use super::host::Host;
use super::value::{materialize, RenderableValue};

/// Handle to a render effect.
pub struct RenderEffect<H: Host> {
    owner: Owner,
    current: Rc<RefCell<H::Node>>,
}

struct RenderComputation<H: Host, F> {
    host: H,
    body: RefCell<F>,
    current: Rc<RefCell<H::Node>>,
}

impl<H, F> Computation for RenderComputation<H, F>
where
    H: Host,
    F: FnMut() -> RenderableValue<H>,
{
    fn run(&self) {
        let value = {
            let mut body = self.body.borrow_mut();
            (*body)()
        };
        let next = materialize(&self.host, value);
        let previous = self.current.replace(next.clone());

        if previous == next {
            return;
        }

        match self.host.parent_node(&previous) {
            Some(parent) => {
                tracing::trace!(?previous, ?next, "replacing rendered node");
                self.host.replace_child(&parent, &next, &previous);
            }
            None => tracing::trace!(?previous, ?next, "previous node unattached, not replacing"),
        }
    }
}

impl<H: Host> RenderEffect<H> {
    /// Create a render effect under the active owner and run it once.
    pub fn new<V>(host: &H, body: impl FnMut() -> V + 'static) -> Self
    where
        V: Into<RenderableValue<H>>,
    {
        let mut body = body;
        let mut body = move || -> RenderableValue<H> { body().into() };

        let owner = Owner::new_child("create_render_effect");
        let first = owner.run_tracked(|| materialize(host, body()));
        let current = Rc::new(RefCell::new(first));

        owner.set_computation(Rc::new(RenderComputation {
            host: host.clone(),
            body: RefCell::new(body),
            current: Rc::clone(&current),
        }));
        owner.settle();

        Self { owner, current }
    }

    /// The node most recently produced.
    pub fn node(&self) -> H::Node {
        self.current.borrow().clone()
    }

    /// The owner the body runs in.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Stop re-rendering. The last node stays where it is.
    pub fn dispose(&self) {
        self.owner.dispose();
    }
}

impl<H: Host> Clone for RenderEffect<H> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            current: Rc::clone(&self.current),
        }
    }
}

impl<H: Host> fmt::Debug for RenderEffect<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEffect")
            .field("owner", &self.owner.id())
            .field("node", &*self.current.borrow())
            .finish()
    }
}

/// Create a render effect and return the node its first run produced.
///
/// The caller is expected to attach the node; later runs replace it in place.
pub fn create_render_effect<H, V>(host: &H, body: impl FnMut() -> V + 'static) -> H::Node
where
    H: Host,
    V: Into<RenderableValue<H>>,
{
    RenderEffect::new(host, body).node()
}

/// Render `body` into `container` under a fresh root.
///
/// The produced node is appended to `container` and kept up to date. Disposing
/// the returned handle stops the render effect and removes its current node
/// from its parent.
pub fn render<H, V>(host: &H, container: &H::Node, body: impl FnMut() -> V + 'static) -> Disposer
where
    H: Host,
    V: Into<RenderableValue<H>>,
{
    create_root(|dispose| {
        let effect = RenderEffect::new(host, body);
        host.append_child(container, &effect.node());

        let host = host.clone();
        on_cleanup(move || {
            let node = effect.node();
            if let Some(parent) = host.parent_node(&node) {
                host.remove_child(&parent, &node);
            }
        });

        dispose
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
