//! Render Layer
//!
//! Binds the reactive core to a host rendering environment.
//!
//! - [`Host`]: the capability set the core needs from the environment (node
//!   creation, attributes, listeners, append/replace/remove, parent lookup).
//! - [`RenderableValue`] and [`materialize`]: what a render body returns and
//!   how it becomes a node.
//! - [`create_render_effect`] / [`RenderEffect`]: effects that produce nodes
//!   and swap them in place when they re-run.
//! - [`render`]: mount a render effect into a container under its own root.
//! - [`MemoryDocument`]: an in-memory host.
//!
//! There is no diffing. A re-run builds a fresh node and replaces the old one;
//! finer granularity comes from nesting render effects.

mod effect;
mod host;
mod memory;
mod value;

pub use effect::{create_render_effect, render, RenderEffect};
pub use host::{Host, Listener};
pub use memory::{MemoryDocument, MemoryEvent, MemoryNode, NodeSnapshot, NodeType};
pub use value::{element, materialize, ElementDescription, Prop, RenderableValue};
