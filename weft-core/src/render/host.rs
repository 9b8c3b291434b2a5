//! The rendering environment the core draws on.

use std::fmt::Debug;
use std::rc::Rc;

/// An event handler bound through [`Host::add_event_listener`].
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// The capability set of a host rendering environment.
///
/// The core never inspects nodes itself. It creates them, sets attributes,
/// binds listeners, and moves them around through these calls only.
///
/// Implementations are cheap handles (cloning shares the same document), so
/// render effects can keep one for their re-runs.
pub trait Host: Clone + 'static {
    /// Handle to a node in the host tree. Equality is node identity.
    type Node: Clone + PartialEq + Debug + 'static;

    /// Payload handed to listeners.
    type Event: 'static;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Self::Node;

    /// Create a detached text node.
    fn create_text_node(&self, text: &str) -> Self::Node;

    /// Create a detached comment, used as a placeholder for empty output.
    fn create_comment(&self, text: &str) -> Self::Node;

    /// Set an attribute on an element.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Bind `listener` to `event` on an element.
    fn add_event_listener(&self, node: &Self::Node, event: &str, listener: Listener<Self::Event>);

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Put `new_child` in the slot `old_child` occupies under `parent`. The old
    /// child ends up detached.
    fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

    /// The live parent of `node`, if it is attached.
    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
}
