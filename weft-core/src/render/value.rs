//! Renderable values and the node materializer.
//!
//! A render body returns a [`RenderableValue`]; [`materialize`] turns it into
//! a concrete host node. Materializing is not reactive: it never reads signals
//! and never creates owners.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::host::{Host, Listener};

/// What a render body can produce.
pub enum RenderableValue<H: Host> {
    /// Nothing. Materializes to a placeholder comment.
    Empty,
    /// A boolean. Materializes to a placeholder comment, like `Empty`.
    Bool(bool),
    /// A text node.
    Text(String),
    /// A floating-point number, rendered as a text node. Integers convert to
    /// `Text` so they render exactly.
    Number(f64),
    /// An existing node, passed through untouched.
    Node(H::Node),
    /// An element to construct.
    Element(ElementDescription<H>),
}

/// A value bound on an element.
pub enum Prop<H: Host> {
    /// Set with [`Host::set_attribute`].
    Attribute(String),
    /// Bound with [`Host::add_event_listener`]. The event name is the prop name
    /// without its `on` prefix, lowercased (`onClick` listens to `click`).
    Listener(Listener<H::Event>),
}

/// Description of an element: tag, props in insertion order, children.
pub struct ElementDescription<H: Host> {
    /// Tag name passed to [`Host::create_element`].
    pub tag: String,
    /// Attributes and listeners, applied in insertion order.
    pub props: IndexMap<String, Prop<H>>,
    /// Children, materialized and appended in order.
    pub children: Vec<RenderableValue<H>>,
}

/// Start describing an element.
pub fn element<H: Host>(tag: impl Into<String>) -> ElementDescription<H> {
    ElementDescription::new(tag)
}

impl<H: Host> ElementDescription<H> {
    /// An element with no props and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.props
            .insert(name.into(), Prop::Attribute(value.into()));
        self
    }

    /// Add a listener for `event` (stored as the `on{event}` prop).
    pub fn on(mut self, event: &str, listener: impl Fn(&H::Event) + 'static) -> Self {
        self.props
            .insert(format!("on{event}"), Prop::Listener(Rc::new(listener)));
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<RenderableValue<H>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RenderableValue<H>>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

/// Event name a listener prop binds to.
fn event_name(prop: &str) -> String {
    prop.strip_prefix("on").unwrap_or(prop).to_ascii_lowercase()
}

/// Turn a produced value into a concrete host node.
pub fn materialize<H: Host>(host: &H, value: RenderableValue<H>) -> H::Node {
    match value {
        RenderableValue::Empty | RenderableValue::Bool(_) => host.create_comment(""),
        RenderableValue::Text(text) => host.create_text_node(&text),
        RenderableValue::Number(number) => host.create_text_node(&number.to_string()),
        RenderableValue::Node(node) => node,
        RenderableValue::Element(description) => {
            let node = host.create_element(&description.tag);
            for (name, prop) in description.props {
                match prop {
                    Prop::Attribute(value) => host.set_attribute(&node, &name, &value),
                    Prop::Listener(listener) => {
                        host.add_event_listener(&node, &event_name(&name), listener)
                    }
                }
            }
            for child in description.children {
                let child = materialize(host, child);
                host.append_child(&node, &child);
            }
            node
        }
    }
}

impl<H: Host> From<()> for RenderableValue<H> {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl<H: Host> From<bool> for RenderableValue<H> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<H: Host> From<&str> for RenderableValue<H> {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<H: Host> From<String> for RenderableValue<H> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<H: Host> From<&String> for RenderableValue<H> {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl<H: Host> From<$ty> for RenderableValue<H> {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )*
    };
}

// Integers keep their exact decimal form; 64-bit values do not fit an f64.
macro_rules! integer_from {
    ($($ty:ty),*) => {
        $(
            impl<H: Host> From<$ty> for RenderableValue<H> {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

number_from!(f32, f64);
integer_from!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<H: Host> From<ElementDescription<H>> for RenderableValue<H> {
    fn from(value: ElementDescription<H>) -> Self {
        Self::Element(value)
    }
}

impl<H: Host, V: Into<RenderableValue<H>>> From<Option<V>> for RenderableValue<H> {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<H: Host> fmt::Debug for RenderableValue<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Number(number) => f.debug_tuple("Number").field(number).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Element(description) => f.debug_tuple("Element").field(description).finish(),
        }
    }
}

impl<H: Host> fmt::Debug for ElementDescription<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props: Vec<(&str, &str)> = self
            .props
            .iter()
            .map(|(name, prop)| match prop {
                Prop::Attribute(value) => (name.as_str(), value.as_str()),
                Prop::Listener(_) => (name.as_str(), "<listener>"),
            })
            .collect();
        f.debug_struct("ElementDescription")
            .field("tag", &self.tag)
            .field("props", &props)
            .field("children", &self.children)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
