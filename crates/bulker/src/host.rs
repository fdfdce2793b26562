//! Host capability interface
//!
//! Everything a collection needs from the document it works on. Presence
//! checks return `Option` / `bool` instead of failing: an element without a
//! property or method is skipped, never reported.

use crate::error::Result;
use bulker_dom::{Arg, Document, Listener, MutationBatch, NodeId, PendingCall, Value};
use std::fmt::Debug;
use std::hash::Hash;
use tokio::sync::broadcast;

pub trait Host {
    /// Element handle, compared by identity
    type Element: Copy + Eq + Hash + Debug;

    /// Only element nodes can join a collection
    fn is_element(&self, element: Self::Element) -> bool;

    /// Elements matching `selector`, in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Does the element itself match `selector`? Invalid selectors never match.
    fn matches(&self, element: Self::Element, selector: &str) -> bool;

    fn property(&self, element: Self::Element, name: &str) -> Option<Value>;

    fn has_property(&self, element: Self::Element, name: &str) -> bool {
        self.property(element, name).is_some()
    }

    /// Can `name` be assigned on the element? Read-only properties exist but are not writable.
    fn is_writable(&self, element: Self::Element, name: &str) -> bool {
        self.has_property(element, name)
    }

    /// Assign when the property exists and is writable; reports whether it was assigned
    fn set_property(&mut self, element: Self::Element, name: &str, value: Value) -> bool;

    /// Prepare a call when the method exists; None otherwise
    ///
    /// The returned call holds whatever embedder code the method triggers
    /// and is run by the caller after releasing its borrow of the host.
    fn begin_call(&mut self, element: Self::Element, name: &str, args: &[Arg]) -> Option<PendingCall>;

    fn add_event_listener(&mut self, element: Self::Element, event: &str, listener: &Listener);

    fn remove_event_listener(&mut self, element: Self::Element, event: &str, listener: &Listener);

    /// Batches of child-list mutations, delivered after the document settles
    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch<Self::Element>>;
}

impl Host for Document {
    type Element = NodeId;

    fn is_element(&self, element: NodeId) -> bool {
        Document::is_element(self, element)
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        Ok(Document::query_selector_all(self, selector)?)
    }

    fn matches(&self, element: NodeId, selector: &str) -> bool {
        Document::matches(self, element, selector).unwrap_or(false)
    }

    fn property(&self, element: NodeId, name: &str) -> Option<Value> {
        Document::property(self, element, name)
    }

    fn has_property(&self, element: NodeId, name: &str) -> bool {
        Document::has_property(self, element, name)
    }

    fn is_writable(&self, element: NodeId, name: &str) -> bool {
        Document::is_writable(self, element, name)
    }

    fn set_property(&mut self, element: NodeId, name: &str, value: Value) -> bool {
        Document::set_property(self, element, name, value)
    }

    fn begin_call(&mut self, element: NodeId, name: &str, args: &[Arg]) -> Option<PendingCall> {
        Document::begin_call(self, element, name, args)
    }

    fn add_event_listener(&mut self, element: NodeId, event: &str, listener: &Listener) {
        Document::add_event_listener(self, element, event, listener.clone());
    }

    fn remove_event_listener(&mut self, element: NodeId, event: &str, listener: &Listener) {
        Document::remove_event_listener(self, element, event, listener);
    }

    fn subscribe_mutations(&self) -> broadcast::Receiver<MutationBatch> {
        Document::subscribe_mutations(self)
    }
}
