//! Document - main entry point for tree operations
//!
//! This handles:
//! - Tree construction and mutation (append, insert, remove)
//! - Selector queries in document order
//! - Element properties, methods and event listeners
//! - Recording child-list mutations and delivering them in batches

use crate::arena::DomArena;
use crate::dispatch::{Dispatch, PendingCall};
use crate::error::{DomError, Result};
use crate::mutation::{MutationBatch, MutationRecord};
use crate::selector::SelectorList;
use crate::serializer;
use crate::types::*;
use crate::utils;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Configuration for a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Nodes to pre-allocate in the arena
    pub node_capacity: usize,
    /// Batches a slow subscriber may fall behind before it lags
    pub mutation_channel_capacity: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            node_capacity: 1024,
            mutation_channel_capacity: 1024,
        }
    }
}

/// In-memory document: `#document > html > (head, body)`
#[derive(Debug)]
pub struct Document {
    config: DocumentConfig,
    arena: DomArena,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    pending: Vec<MutationRecord>,
    sequence: u64,
    mutations: broadcast::Sender<MutationBatch>,
}

impl Document {
    /// Create new document with default config
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Create document with custom config
    pub fn with_config(config: DocumentConfig) -> Self {
        let mut arena = DomArena::with_capacity(config.node_capacity);
        let root = arena.add_node(DomNode::document(NodeId(0)));
        let html = arena.add_node(DomNode::element(NodeId(0), "html"));
        let head = arena.add_node(DomNode::element(NodeId(0), "head"));
        let body = arena.add_node(DomNode::element(NodeId(0), "body"));

        for (parent, child) in [(root, html), (html, head), (html, body)] {
            if let Ok(node) = arena.get_mut(parent) {
                node.children_ids.push(child);
            }
            if let Ok(node) = arena.get_mut(child) {
                node.parent_id = Some(parent);
            }
        }
        let (mutations, _) = broadcast::channel(config.mutation_channel_capacity.max(1));

        Self {
            config,
            arena,
            root,
            html,
            head,
            body,
            pending: Vec::new(),
            sequence: 0,
            mutations,
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.arena.get(node_id).is_ok_and(|n| n.is_element())
    }

    /// Is the node part of the tree rooted at the document?
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        self.arena.contains(node_id) && self.arena.is_inclusive_ancestor(self.root, node_id)
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.arena.get(node_id).ok().and_then(|n| n.parent_id)
    }

    pub fn children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.arena
            .get(node_id)
            .map(|n| n.children_ids.to_vec())
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Node creation
    // ---------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.add_node(DomNode::element(NodeId(0), tag))
    }

    /// Create a detached text node
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.arena.add_node(DomNode::text(NodeId(0), text))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena.add_node(DomNode::comment(NodeId(0), text))
    }

    // ---------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.attach(parent, child, None)
    }

    /// Insert `child` before `reference`, or append when `reference` is None
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId> {
        self.attach(parent, child, reference)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        if self.arena.get(child)?.parent_id != Some(parent) {
            return Err(DomError::NotAChild {
                parent: parent.0,
                child: child.0,
            });
        }
        self.detach(child)?;
        Ok(child)
    }

    /// Detach a node from its parent; no-op for detached nodes
    pub fn remove(&mut self, node_id: NodeId) -> Result<()> {
        self.detach(node_id)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<NodeId> {
        let hierarchy_error = DomError::HierarchyRequest {
            parent: parent.0,
            child: child.0,
        };

        let parent_type = self.arena.get(parent)?.node_type;
        let child_type = self.arena.get(child)?.node_type;
        if !matches!(parent_type, NodeType::Element | NodeType::Document)
            || child_type == NodeType::Document
            || self.arena.is_inclusive_ancestor(child, parent)
        {
            return Err(hierarchy_error);
        }

        let mut reference = reference;
        if let Some(r) = reference {
            if self.arena.get(r)?.parent_id != Some(parent) {
                return Err(DomError::NotAChild {
                    parent: parent.0,
                    child: r.0,
                });
            }
            if r == child {
                reference = self.next_sibling(child);
            }
        }

        self.detach(child)?;

        let siblings = &mut self.arena.get_mut(parent)?.children_ids;
        let index = reference
            .and_then(|r| siblings.iter().position(|&id| id == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        let previous_sibling = index.checked_sub(1).map(|i| siblings[i]);
        let next_sibling = siblings.get(index + 1).copied();

        self.arena.get_mut(child)?.parent_id = Some(parent);

        if self.is_connected(parent) {
            tracing::trace!("recorded insertion of {} under {}", child, parent);
            self.pending.push(MutationRecord::added(
                parent,
                child,
                previous_sibling,
                next_sibling,
            ));
        }

        Ok(child)
    }

    fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.arena.get(child)?.parent_id else {
            return Ok(());
        };

        let siblings = &mut self.arena.get_mut(parent)?.children_ids;
        let Some(index) = siblings.iter().position(|&id| id == child) else {
            return Ok(());
        };
        siblings.remove(index);
        let previous_sibling = index.checked_sub(1).map(|i| siblings[i]);
        let next_sibling = siblings.get(index).copied();

        self.arena.get_mut(child)?.parent_id = None;

        if self.is_connected(parent) {
            tracing::trace!("recorded removal of {} from {}", child, parent);
            self.pending.push(MutationRecord::removed(
                parent,
                child,
                previous_sibling,
                next_sibling,
            ));
        }

        Ok(())
    }

    fn next_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = &self.arena.get(parent).ok()?.children_ids;
        let index = siblings.iter().position(|&id| id == node_id)?;
        siblings.get(index + 1).copied()
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// All connected elements matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_within(self.root, selector)
    }

    /// Descendants of `scope` matching `selector`, in document order
    pub fn query_selector_all_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .arena
            .descendant_elements(scope)?
            .into_iter()
            .filter(|&id| list.matches(&self.arena, id))
            .collect())
    }

    /// First connected element matching `selector`
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Does the node itself match `selector`?
    pub fn matches(&self, node_id: NodeId, selector: &str) -> Result<bool> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(&self.arena, node_id))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.arena
            .descendant_elements(self.root)
            .ok()?
            .into_iter()
            .find(|&node_id| self.get_attribute(node_id, "id").as_deref() == Some(id))
    }

    // ---------------------------------------------------------------------
    // Attributes and text
    // ---------------------------------------------------------------------

    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.arena.get(node_id).ok()?.attr(name).map(String::from)
    }

    pub fn has_attribute(&self, node_id: NodeId, name: &str) -> bool {
        self.arena
            .get(node_id)
            .is_ok_and(|n| n.attributes.contains_key(name))
    }

    pub fn set_attribute(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.arena.get_mut(node_id)?;
        if !node.is_element() {
            return Err(DomError::InvalidTree(format!(
                "{} is not an element",
                node_id
            )));
        }
        node.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    /// Returns whether the attribute was present
    pub fn remove_attribute(&mut self, node_id: NodeId, name: &str) -> Result<bool> {
        Ok(self.arena.get_mut(node_id)?.attributes.remove(name).is_some())
    }

    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        utils::get_text_content(&self.arena, node_id)
    }

    /// Replace all children with a single text node (none for empty text)
    pub fn set_text_content(&mut self, node_id: NodeId, text: &str) -> Result<()> {
        for child in self.arena.get(node_id)?.children_ids.to_vec() {
            self.detach(child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text_node(text);
            self.append_child(node_id, text_node)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------------

    /// Does the node expose `name` as a property?
    pub fn has_property(&self, node_id: NodeId, name: &str) -> bool {
        let Ok(node) = self.arena.get(node_id) else {
            return false;
        };
        if node.is_element() {
            COMPUTED_PROPERTIES.contains(&name) || node.properties.contains_key(name)
        } else {
            matches!(name, "textContent" | "nodeName" | "isConnected")
        }
    }

    /// Current property value, None when the node has no such property
    pub fn property(&self, node_id: NodeId, name: &str) -> Option<Value> {
        if !self.has_property(node_id, name) {
            return None;
        }
        let node = self.arena.get(node_id).ok()?;

        let value = match name {
            "id" => Value::from(node.attr("id").unwrap_or("")),
            "className" => Value::from(node.attr("class").unwrap_or("")),
            "textContent" => Value::from(self.text_content(node_id).ok()?),
            "tagName" => Value::from(node.node_name.to_ascii_uppercase()),
            "nodeName" if node.is_element() => Value::from(node.node_name.to_ascii_uppercase()),
            "nodeName" => Value::from(node.node_name.as_str()),
            "innerHTML" => Value::from(serializer::inner_html(&self.arena, node_id).ok()?),
            "outerHTML" => Value::from(serializer::outer_html(&self.arena, node_id).ok()?),
            "childElementCount" => Value::from(
                node.children_ids
                    .iter()
                    .filter(|&&id| self.is_element(id))
                    .count(),
            ),
            "isConnected" => Value::from(self.is_connected(node_id)),
            _ => node.properties.get(name)?.clone(),
        };

        Some(value)
    }

    /// Does the element expose `name` and accept assignment to it?
    pub fn is_writable(&self, node_id: NodeId, name: &str) -> bool {
        self.is_element(node_id)
            && self.has_property(node_id, name)
            && !READ_ONLY_PROPERTIES.contains(&name)
    }

    /// Assign a property; false when absent or read-only
    pub fn set_property(&mut self, node_id: NodeId, name: &str, value: Value) -> bool {
        if !self.is_writable(node_id, name) {
            return false;
        }

        let result = match name {
            "id" => self.set_attribute(node_id, "id", &value_to_string(&value)),
            "className" => self.set_attribute(node_id, "class", &value_to_string(&value)),
            "textContent" => self.set_text_content(node_id, &value_to_string(&value)),
            _ => self.arena.get_mut(node_id).map(|node| {
                node.properties.insert(name.to_string(), value);
            }),
        };

        result.is_ok()
    }

    /// Add an expando property to an element
    pub fn define_property(&mut self, node_id: NodeId, name: &str, value: Value) -> Result<()> {
        self.arena
            .get_mut(node_id)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Methods
    // ---------------------------------------------------------------------

    /// Attach a custom method to one element, shadowing a builtin of the same name
    pub fn define_method(&mut self, node_id: NodeId, name: &str, method: Method) -> Result<()> {
        self.arena
            .get_mut(node_id)?
            .methods
            .insert(name.to_string(), method);
        Ok(())
    }

    pub fn has_method(&self, node_id: NodeId, name: &str) -> bool {
        self.arena.get(node_id).is_ok_and(|node| {
            node.is_element()
                && (node.methods.contains_key(name) || BUILTIN_METHODS.contains(&name))
        })
    }

    /// Invoke a method and run any listeners it fires; None when the node has no such method
    ///
    /// Embedder code runs while `self` is borrowed. Callers sharing the
    /// document use `begin_call` instead.
    pub fn call_method(&mut self, node_id: NodeId, name: &str, args: &[Arg]) -> Option<Value> {
        self.begin_call(node_id, name, args).map(PendingCall::run)
    }

    /// Apply a method's effect on the document, deferring embedder code
    ///
    /// Builtins follow their DOM counterparts but never fail: malformed
    /// arguments make the call a no-op returning null. Listeners fired by
    /// `click` / `dispatchEvent` and custom methods are left in the returned
    /// call, to be run once the document is no longer borrowed.
    pub fn begin_call(&mut self, node_id: NodeId, name: &str, args: &[Arg]) -> Option<PendingCall> {
        if !self.has_method(node_id, name) {
            return None;
        }

        let custom = self.arena.get(node_id).ok()?.methods.get(name).cloned();
        if let Some(method) = custom {
            return Some(PendingCall::Custom {
                method,
                node_id,
                args: args.to_vec(),
            });
        }

        let str_arg = |i: usize| args.get(i).and_then(Arg::as_str);
        let listener_arg = |i: usize| args.get(i).and_then(Arg::as_listener);

        let result = match name {
            "addEventListener" => {
                if let (Some(event), Some(listener)) = (str_arg(0), listener_arg(1)) {
                    self.add_event_listener(node_id, event, listener.clone());
                }
                Value::Null
            }
            "removeEventListener" => {
                if let (Some(event), Some(listener)) = (str_arg(0), listener_arg(1)) {
                    self.remove_event_listener(node_id, event, listener);
                }
                Value::Null
            }
            "dispatchEvent" => match str_arg(0) {
                Some(event) => {
                    let detail = args.get(1).and_then(Arg::as_value).cloned();
                    return Some(PendingCall::Dispatch {
                        dispatch: self.event_dispatch(node_id, event, detail.unwrap_or(Value::Null)),
                        result: Value::from(true),
                    });
                }
                None => Value::from(false),
            },
            "click" => {
                return Some(PendingCall::Dispatch {
                    dispatch: self.event_dispatch(node_id, "click", Value::Null),
                    result: Value::Null,
                });
            }
            "setAttribute" => {
                if let (Some(attr), Some(value)) = (str_arg(0), args.get(1)) {
                    let _ = self.set_attribute(node_id, attr, &arg_to_string(value));
                }
                Value::Null
            }
            "getAttribute" => str_arg(0)
                .and_then(|attr| self.get_attribute(node_id, attr))
                .map(Value::from)
                .unwrap_or(Value::Null),
            "hasAttribute" => {
                Value::from(str_arg(0).is_some_and(|attr| self.has_attribute(node_id, attr)))
            }
            "removeAttribute" => {
                if let Some(attr) = str_arg(0) {
                    let _ = self.remove_attribute(node_id, attr);
                }
                Value::Null
            }
            "toggleAttribute" => match str_arg(0) {
                Some(attr) if self.has_attribute(node_id, attr) => {
                    let _ = self.remove_attribute(node_id, attr);
                    Value::from(false)
                }
                Some(attr) => Value::from(self.set_attribute(node_id, attr, "").is_ok()),
                None => Value::from(false),
            },
            "remove" => {
                let _ = self.remove(node_id);
                Value::Null
            }
            _ => return None,
        };

        Some(PendingCall::Done(result))
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Register a listener; the same (event, listener) pair is stored once
    pub fn add_event_listener(&mut self, node_id: NodeId, event: &str, listener: Listener) -> bool {
        let Ok(node) = self.arena.get_mut(node_id) else {
            return false;
        };
        if node
            .listeners
            .iter()
            .any(|(e, l)| e == event && *l == listener)
        {
            return false;
        }
        node.listeners.push((event.to_string(), listener));
        true
    }

    pub fn remove_event_listener(&mut self, node_id: NodeId, event: &str, listener: &Listener) -> bool {
        let Ok(node) = self.arena.get_mut(node_id) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners
            .retain(|(e, l)| !(e == event && l == listener));
        node.listeners.len() != before
    }

    pub fn listener_count(&self, node_id: NodeId, event: &str) -> usize {
        self.arena
            .get(node_id)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Fire an event at `node_id`, bubbling to the root
    ///
    /// Returns the number of listeners invoked. Listeners run while `self`
    /// is borrowed; a listener that needs the document mutably must be fired
    /// through `event_dispatch` after the borrow is released.
    pub fn dispatch_event(&self, node_id: NodeId, event_type: &str) -> usize {
        self.dispatch_event_with(node_id, event_type, Value::Null)
    }

    pub fn dispatch_event_with(&self, node_id: NodeId, event_type: &str, detail: Value) -> usize {
        self.event_dispatch(node_id, event_type, detail).run()
    }

    /// Collect the listeners an event would reach, without running them
    ///
    /// The listener set is fixed here: listeners added or removed while the
    /// dispatch runs do not affect it.
    pub fn event_dispatch(&self, node_id: NodeId, event_type: &str, detail: Value) -> Dispatch {
        let mut dispatch = Dispatch::default();
        if !self.arena.contains(node_id) {
            return dispatch;
        }

        let path = std::iter::once(node_id).chain(self.arena.ancestors(node_id));
        for current in path {
            let listeners: Vec<Listener> = match self.arena.get(current) {
                Ok(node) => node
                    .listeners
                    .iter()
                    .filter(|(e, _)| e == event_type)
                    .map(|(_, l)| l.clone())
                    .collect(),
                Err(_) => continue,
            };

            let event = Event {
                event_type: event_type.to_string(),
                target: node_id,
                current_target: current,
                detail: detail.clone(),
            };
            for listener in listeners {
                dispatch.push(listener, event.clone());
            }
        }

        dispatch
    }

    // ---------------------------------------------------------------------
    // Mutation delivery
    // ---------------------------------------------------------------------

    /// Receive every batch flushed from now on
    pub fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
        self.mutations.subscribe()
    }

    /// Records waiting for the next flush
    pub fn pending_mutations(&self) -> usize {
        self.pending.len()
    }

    /// Take the pending records without delivering them
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }

    /// Deliver pending records as one batch; returns its sequence number
    pub fn flush_mutations(&mut self) -> Option<u64> {
        if self.pending.is_empty() {
            return None;
        }

        self.sequence += 1;
        let batch = MutationBatch {
            sequence: self.sequence,
            records: std::mem::take(&mut self.pending),
        };
        tracing::debug!(
            "flushing mutation batch {} ({} records)",
            batch.sequence,
            batch.records.len()
        );

        // Ignore error if no subscribers
        let _ = self.mutations.send(batch);
        Some(self.sequence)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// String conversion used for reflected string properties
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn arg_to_string(arg: &Arg) -> String {
    match arg {
        Arg::Value(value) => value_to_string(value),
        Arg::Listener(_) => "[function]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn item(doc: &mut Document, class: &str) -> NodeId {
        let li = doc.create_element("li");
        doc.set_attribute(li, "class", class).unwrap();
        li
    }

    #[test]
    fn test_document_structure() {
        let doc = Document::new();
        assert_eq!(doc.node(doc.body()).unwrap().node_name, "body");
        assert_eq!(doc.parent(doc.body()), Some(doc.document_element()));
        assert!(doc.is_connected(doc.head()));
        assert_eq!(doc.pending_mutations(), 0);
    }

    #[test]
    fn test_append_and_query_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let ul = doc.create_element("ul");
        let a = item(&mut doc, "item");
        let b = item(&mut doc, "other");
        let c = item(&mut doc, "item");
        doc.append_child(ul, a).unwrap();
        doc.append_child(ul, b).unwrap();
        doc.insert_before(ul, c, Some(a)).unwrap();

        // Detached subtree is invisible to queries
        assert!(doc.query_selector_all(".item").unwrap().is_empty());

        doc.append_child(body, ul).unwrap();
        assert_eq!(doc.query_selector_all(".item").unwrap(), vec![c, a]);
        assert_eq!(doc.query_selector("li").unwrap(), Some(c));
        assert!(doc.matches(b, "ul > li.other").unwrap());
        assert!(matches!(
            doc.query_selector_all("li:first-child"),
            Err(DomError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_attribute_selectors_ignore_name_case() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        doc.set_attribute(div, "data-X", "1").unwrap();
        doc.append_child(body, div).unwrap();

        assert_eq!(doc.get_attribute(div, "data-x").as_deref(), Some("1"));
        assert_eq!(doc.query_selector_all("[data-X]").unwrap(), vec![div]);
        assert!(doc.matches(div, "div[DATA-x='1']").unwrap());
    }

    #[test]
    fn test_hierarchy_errors() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("div");
        let text = doc.create_text_node("x");
        doc.append_child(body, div).unwrap();

        assert!(matches!(
            doc.append_child(div, body),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            doc.append_child(text, div),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            doc.remove_child(div, body),
            Err(DomError::NotAChild { .. })
        ));
        assert!(matches!(
            doc.append_child(body, NodeId(9999)),
            Err(DomError::NodeNotFound(9999))
        ));
    }

    #[test]
    fn test_mutation_records_only_for_connected_tree() {
        let mut doc = Document::new();
        let body = doc.body();
        let ul = doc.create_element("ul");
        let li = doc.create_element("li");
        doc.append_child(ul, li).unwrap();
        assert_eq!(doc.pending_mutations(), 0);

        doc.append_child(body, ul).unwrap();
        doc.remove_child(ul, li).unwrap();
        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].added_nodes.as_slice(), &[ul]);
        assert_eq!(records[1].removed_nodes.as_slice(), &[li]);
        assert_eq!(records[1].target, ul);
    }

    #[test]
    fn test_moving_node_records_removal_then_insertion() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(body, first).unwrap();
        doc.append_child(body, second).unwrap();
        doc.append_child(first, span).unwrap();
        doc.take_records();

        doc.append_child(second, span).unwrap();
        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].removed_nodes.as_slice(), &[span]);
        assert_eq!(records[1].added_nodes.as_slice(), &[span]);
        assert_eq!(doc.children(first), Vec::<NodeId>::new());
        assert_eq!(doc.children(second), vec![span]);
    }

    #[test]
    fn test_properties() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.create_element("input");
        let div = doc.create_element("div");
        doc.append_child(body, input).unwrap();
        doc.append_child(body, div).unwrap();

        assert_eq!(doc.property(input, "value"), Some(Value::from("")));
        assert_eq!(doc.property(div, "value"), None);
        assert!(doc.set_property(input, "value", Value::from("hello")));
        assert!(!doc.set_property(div, "value", Value::from("hello")));
        assert_eq!(doc.property(input, "value"), Some(Value::from("hello")));

        assert!(doc.set_property(div, "className", Value::from("item big")));
        assert!(doc.matches(div, ".big").unwrap());
        assert!(doc.set_property(div, "textContent", Value::from("hi <b>")));
        assert_eq!(doc.property(div, "textContent"), Some(Value::from("hi <b>")));
        assert_eq!(
            doc.property(div, "outerHTML"),
            Some(Value::from("<div class=\"item big\">hi &lt;b&gt;</div>"))
        );
        assert_eq!(doc.property(div, "tagName"), Some(Value::from("DIV")));
        assert!(!doc.set_property(div, "tagName", Value::from("P")));
        assert!(doc.has_property(div, "innerHTML"));
        assert!(!doc.is_writable(div, "innerHTML"));
        assert!(!doc.set_property(div, "innerHTML", Value::from("<p></p>")));
        assert!(doc.is_writable(div, "textContent"));
        assert_eq!(doc.property(body, "childElementCount"), Some(Value::from(2)));
    }

    #[test]
    fn test_builtin_and_custom_methods() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("t");

        assert_eq!(
            doc.call_method(div, "setAttribute", &["data-x".into(), 5i64.into()]),
            Some(Value::Null)
        );
        assert_eq!(doc.get_attribute(div, "data-x").as_deref(), Some("5"));
        assert_eq!(
            doc.call_method(div, "toggleAttribute", &["data-x".into()]),
            Some(Value::from(false))
        );
        assert_eq!(doc.call_method(div, "highlight", &[]), None);
        assert_eq!(doc.call_method(text, "click", &[]), None);

        doc.define_method(
            div,
            "highlight",
            Method::new(move |node, args| {
                let color = args.first().and_then(Arg::as_str).unwrap_or("yellow");
                Value::from(format!("{node}:{color}"))
            }),
        )
        .unwrap();
        assert_eq!(
            doc.call_method(div, "highlight", &["red".into()]),
            Some(Value::from(format!("{div}:red")))
        );
    }

    #[test]
    fn test_begin_call_defers_listeners() {
        let doc = Rc::new(RefCell::new(Document::new()));
        let button = {
            let mut doc = doc.borrow_mut();
            let body = doc.body();
            let button = doc.create_element("button");
            doc.append_child(body, button).unwrap();
            button
        };

        // The listener mutates the document it was fired from
        let handle = doc.clone();
        let listener = Listener::new(move |e| {
            handle
                .borrow_mut()
                .set_attribute(e.target, "data-clicked", "yes")
                .unwrap();
        });
        doc.borrow_mut().add_event_listener(button, "click", listener);

        let pending = doc.borrow_mut().begin_call(button, "click", &[]).unwrap();
        assert!(!doc.borrow().has_attribute(button, "data-clicked"));
        assert_eq!(pending.run(), Value::Null);
        assert_eq!(
            doc.borrow().get_attribute(button, "data-clicked").as_deref(),
            Some("yes")
        );

        let dispatch = doc.borrow().event_dispatch(button, "click", Value::Null);
        assert_eq!(dispatch.len(), 1);
        assert_eq!(dispatch.run(), 1);
    }

    #[test]
    fn test_listeners_and_bubbling() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = doc.create_element("button");
        doc.append_child(body, button).unwrap();

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener = Listener::new(move |_| counter.set(counter.get() + 1));

        assert!(doc.add_event_listener(button, "click", listener.clone()));
        assert!(!doc.add_event_listener(button, "click", listener.clone()));
        doc.add_event_listener(body, "click", listener.clone());

        assert_eq!(doc.call_method(button, "click", &[]), Some(Value::Null));
        assert_eq!(hits.get(), 2);

        assert!(doc.remove_event_listener(button, "click", &listener));
        assert_eq!(doc.dispatch_event(button, "click"), 1);
        assert_eq!(hits.get(), 3);
        assert_eq!(doc.listener_count(button, "click"), 0);
    }

    #[tokio::test]
    async fn test_flush_delivers_batches_in_order() {
        let mut doc = Document::new();
        let mut rx = doc.subscribe_mutations();
        let body = doc.body();

        assert_eq!(doc.flush_mutations(), None);

        let a = doc.create_element("p");
        doc.append_child(body, a).unwrap();
        assert_eq!(doc.flush_mutations(), Some(1));

        doc.remove(a).unwrap();
        assert_eq!(doc.flush_mutations(), Some(2));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(first.added_nodes().collect::<Vec<_>>(), vec![a]);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.removed_nodes().collect::<Vec<_>>(), vec![a]);
    }
}
