//! Collection inputs
//!
//! Everything a collection can be built from, as one sum type. The resolver
//! matches on it exhaustively, so a new input kind cannot be forgotten.

use crate::collection::Collection;
use crate::host::Host;
use bulker_dom::{Document, NodeId};

pub enum Entity<H: Host> {
    /// A single element
    Element(H::Element),
    /// A node list, e.g. the result of a query
    Elements(Vec<H::Element>),
    /// Nested inputs of any kind
    Array(Vec<Entity<H>>),
    /// Selector resolved against the host document
    Selector(String),
    /// A previously built collection; its members are merged as-is
    Collection(Collection<H>),
    /// Anything else; resolves to nothing
    Other,
}

impl<H: Host> Entity<H> {
    pub fn element(element: H::Element) -> Self {
        Entity::Element(element)
    }

    pub fn selector(selector: impl Into<String>) -> Self {
        Entity::Selector(selector.into())
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Element(_) => "element",
            Entity::Elements(_) => "element list",
            Entity::Array(_) => "array",
            Entity::Selector(_) => "selector",
            Entity::Collection(_) => "collection",
            Entity::Other => "other",
        }
    }
}

impl<H: Host> Clone for Entity<H> {
    fn clone(&self) -> Self {
        match self {
            Entity::Element(e) => Entity::Element(*e),
            Entity::Elements(list) => Entity::Elements(list.clone()),
            Entity::Array(items) => Entity::Array(items.clone()),
            Entity::Selector(s) => Entity::Selector(s.clone()),
            Entity::Collection(c) => Entity::Collection(c.clone()),
            Entity::Other => Entity::Other,
        }
    }
}

impl<H: Host> std::fmt::Debug for Entity<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Element(e) => f.debug_tuple("Element").field(e).finish(),
            Entity::Elements(list) => f.debug_tuple("Elements").field(list).finish(),
            Entity::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Entity::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Entity::Collection(c) => f.debug_tuple("Collection").field(&c.elements()).finish(),
            Entity::Other => f.write_str("Other"),
        }
    }
}

impl<H: Host> From<&str> for Entity<H> {
    fn from(selector: &str) -> Self {
        Entity::Selector(selector.to_string())
    }
}

impl<H: Host> From<String> for Entity<H> {
    fn from(selector: String) -> Self {
        Entity::Selector(selector)
    }
}

impl<H: Host> From<Collection<H>> for Entity<H> {
    fn from(collection: Collection<H>) -> Self {
        Entity::Collection(collection)
    }
}

impl<H: Host> From<&Collection<H>> for Entity<H> {
    fn from(collection: &Collection<H>) -> Self {
        Entity::Collection(collection.clone())
    }
}

impl<H: Host> From<Vec<Entity<H>>> for Entity<H> {
    fn from(items: Vec<Entity<H>>) -> Self {
        Entity::Array(items)
    }
}

impl From<NodeId> for Entity<Document> {
    fn from(node: NodeId) -> Self {
        Entity::Element(node)
    }
}

impl From<Vec<NodeId>> for Entity<Document> {
    fn from(nodes: Vec<NodeId>) -> Self {
        Entity::Elements(nodes)
    }
}

impl From<&[NodeId]> for Entity<Document> {
    fn from(nodes: &[NodeId]) -> Self {
        Entity::Elements(nodes.to_vec())
    }
}

impl<H: Host, T: Into<Entity<H>>> From<Option<T>> for Entity<H> {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Entity::Other)
    }
}
