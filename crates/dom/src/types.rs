//! Core type definitions for the in-memory document
//!
//! Key design principles:
//! 1. Use u32 indices wrapped in `NodeId` (4 bytes, identity-comparable)
//! 2. Use SmallVec for child lists (most nodes have few children)
//! 3. Closures shared through `Rc` compare by pointer, not by value

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

pub use serde_json::Value;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node type matching DOM specification numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Comment = 8,
    Document = 9,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            3 => Some(NodeType::Text),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            _ => None,
        }
    }
}

/// Event raised on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    /// Node whose listener is currently running (changes while bubbling)
    pub current_target: NodeId,
    pub detail: Value,
}

/// Event listener, compared by identity like a JS function reference
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

/// Method argument
///
/// Plain values travel as JSON; listeners keep their identity so that
/// `removeEventListener` can find what `addEventListener` stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Listener(Listener),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Value(v) => v.as_str(),
            Arg::Listener(_) => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Arg::Listener(l) => Some(l),
            Arg::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Listener(_) => None,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(Value::from(value))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(Value::from(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Value(Value::from(value))
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Value(Value::from(value))
    }
}

impl From<Listener> for Arg {
    fn from(value: Listener) -> Self {
        Arg::Listener(value)
    }
}

impl From<&Listener> for Arg {
    fn from(value: &Listener) -> Self {
        Arg::Listener(value.clone())
    }
}

/// Per-element method defined by the embedder
///
/// Runs after the document borrow is released and receives the id of the
/// element it was called on; state it needs is captured by the closure.
#[derive(Clone)]
pub struct Method(Rc<dyn Fn(NodeId, &[Arg]) -> Value>);

impl Method {
    pub fn new(f: impl Fn(NodeId, &[Arg]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, node_id: NodeId, args: &[Arg]) -> Value {
        (self.0)(node_id, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Rc::as_ptr(&self.0))
    }
}

/// The main tree node structure
#[derive(Debug, Clone)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>,

    /// Lowercase tag name for elements, `#text` / `#comment` / `#document` otherwise
    pub node_name: String,
    /// Character data for text and comment nodes
    pub node_value: String,
    pub attributes: AHashMap<String, String>,

    /// Stored (non-reflected) properties such as `title`, `value` or `onclick`
    pub properties: AHashMap<String, Value>,
    pub methods: AHashMap<String, Method>,
    pub listeners: Vec<(String, Listener)>,
}

impl DomNode {
    fn bare(node_id: NodeId, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: AHashMap::new(),
            properties: AHashMap::new(),
            methods: AHashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Create an element with the default stored properties for its tag
    pub fn element(node_id: NodeId, tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let mut node = Self::bare(node_id, NodeType::Element, tag);

        for name in ELEMENT_PROPERTIES {
            node.properties.insert((*name).to_string(), initial_value(name));
        }
        for event in EVENT_TYPES {
            node.properties.insert(format!("on{event}"), Value::Null);
        }
        if FORM_CONTROL_TAGS.contains(&node.node_name.as_str()) {
            for name in FORM_CONTROL_PROPERTIES {
                node.properties.insert((*name).to_string(), initial_value(name));
            }
        }

        node
    }

    pub fn text(node_id: NodeId, content: &str) -> Self {
        let mut node = Self::bare(node_id, NodeType::Text, "#text".to_string());
        node.node_value = content.to_string();
        node
    }

    pub fn comment(node_id: NodeId, content: &str) -> Self {
        let mut node = Self::bare(node_id, NodeType::Comment, "#comment".to_string());
        node.node_value = content.to_string();
        node
    }

    pub fn document(node_id: NodeId) -> Self {
        Self::bare(node_id, NodeType::Document, "#document".to_string())
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whitespace-separated `class` attribute tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Event types every element supports (each gets an `on<type>` property)
pub const EVENT_TYPES: &[&str] = &[
    "click",
    "dblclick",
    "mousedown",
    "mouseup",
    "mouseover",
    "mouseout",
    "keydown",
    "keyup",
    "focus",
    "blur",
    "input",
    "change",
    "submit",
    "scroll",
];

/// Tags that carry form control state
pub const FORM_CONTROL_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// Stored properties present on every element
pub const ELEMENT_PROPERTIES: &[&str] = &["title", "hidden", "lang", "dir", "tabIndex"];

/// Stored properties present on form controls only
pub const FORM_CONTROL_PROPERTIES: &[&str] = &["value", "checked", "disabled"];

fn initial_value(name: &str) -> Value {
    match name {
        "hidden" | "checked" | "disabled" => Value::from(false),
        "tabIndex" => Value::from(-1),
        _ => Value::from(""),
    }
}

/// Properties computed from the tree; they exist on every element
pub const COMPUTED_PROPERTIES: &[&str] = &[
    "id",
    "className",
    "textContent",
    "tagName",
    "nodeName",
    "innerHTML",
    "outerHTML",
    "childElementCount",
    "isConnected",
];

/// Computed properties that silently ignore assignment
///
/// `innerHTML` / `outerHTML` are readable serializations only: the document
/// has no HTML parser to assign them from.
pub const READ_ONLY_PROPERTIES: &[&str] = &[
    "tagName",
    "nodeName",
    "innerHTML",
    "outerHTML",
    "childElementCount",
    "isConnected",
];

/// Methods every element exposes
pub const BUILTIN_METHODS: &[&str] = &[
    "addEventListener",
    "removeEventListener",
    "dispatchEvent",
    "click",
    "setAttribute",
    "getAttribute",
    "removeAttribute",
    "hasAttribute",
    "toggleAttribute",
    "remove",
];
