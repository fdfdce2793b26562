//! Bulk collection
//!
//! A resolved, ordered set of elements with operations that apply to every
//! member. Members lacking the named property, method or event are skipped.
//!
//! A `Collection` is a handle: clones share the same members, which is what
//! lets a `Tracker` update a collection the caller still holds.

use crate::config::BulkerConfig;
use crate::host::Host;
use bulker_dom::{Arg, Listener, Value};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// A recorded call of a shareable method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRecord {
    pub name: String,
    pub args: Vec<Arg>,
}

/// Result of `Collection::get`
///
/// Exactly one qualifying element yields its value unwrapped; any other
/// count (zero included) yields the ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    One(Value),
    Many(Vec<Value>),
}

impl Values {
    fn from_vec(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            Values::One(values.remove(0))
        } else {
            Values::Many(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::One(_) => 1,
            Values::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_one(&self) -> Option<&Value> {
        match self {
            Values::One(value) => Some(value),
            Values::Many(_) => None,
        }
    }

    /// Flatten to a list regardless of shape
    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Values::One(value) => vec![value],
            Values::Many(values) => values,
        }
    }
}

/// Mutable state shared between a collection's handles and the tracker
#[derive(Debug)]
pub(crate) struct Members<E> {
    pub(crate) elements: Vec<E>,
    pub(crate) selectors: Vec<String>,
    pub(crate) shared: Vec<MethodRecord>,
}

impl<E> Default for Members<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            selectors: Vec::new(),
            shared: Vec::new(),
        }
    }
}

pub struct Collection<H: Host> {
    host: Rc<RefCell<H>>,
    config: Rc<BulkerConfig>,
    members: Rc<RefCell<Members<H::Element>>>,
}

impl<H: Host> Clone for Collection<H> {
    fn clone(&self) -> Self {
        Self {
            host: Rc::clone(&self.host),
            config: Rc::clone(&self.config),
            members: Rc::clone(&self.members),
        }
    }
}

impl<H: Host> std::fmt::Debug for Collection<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members = self.members.borrow();
        f.debug_struct("Collection")
            .field("elements", &members.elements)
            .field("selectors", &members.selectors)
            .field("shared", &members.shared.len())
            .finish()
    }
}

impl<H: Host> Collection<H> {
    pub(crate) fn from_members(
        host: Rc<RefCell<H>>,
        config: Rc<BulkerConfig>,
        members: Members<H::Element>,
    ) -> Self {
        Self {
            host,
            config,
            members: Rc::new(RefCell::new(members)),
        }
    }

    pub(crate) fn members(&self) -> &Rc<RefCell<Members<H::Element>>> {
        &self.members
    }

    /// Snapshot of the members, in order
    pub fn elements(&self) -> Vec<H::Element> {
        self.members.borrow().elements.clone()
    }

    /// Selector strings that contributed to the collection, in first-use order
    pub fn selectors(&self) -> Ref<'_, [String]> {
        Ref::map(self.members.borrow(), |m| m.selectors.as_slice())
    }

    /// Shareable calls recorded so far, in call order
    pub fn shared_methods(&self) -> Vec<MethodRecord> {
        self.members.borrow().shared.clone()
    }

    pub fn len(&self) -> usize {
        self.members.borrow().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().elements.is_empty()
    }

    pub fn first(&self) -> Option<H::Element> {
        self.members.borrow().elements.first().copied()
    }

    pub fn contains(&self, element: H::Element) -> bool {
        self.members.borrow().elements.contains(&element)
    }

    /// Do two handles refer to the same collection?
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.members, &other.members)
    }

    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    /// Values of `property` from every element that has it
    pub fn get(&self, property: &str) -> Values {
        let host = self.host.borrow();
        let values = self
            .members
            .borrow()
            .elements
            .iter()
            .filter_map(|&element| host.property(element, property))
            .collect();
        Values::from_vec(values)
    }

    /// Assign `value` to `property` on every element where it is writable
    ///
    /// Elements lacking the property are skipped, as are read-only
    /// properties such as `tagName` or `innerHTML`.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();
        let elements = self.elements();
        let mut host = self.host.borrow_mut();
        for element in elements {
            if host.is_writable(element, property) {
                host.set_property(element, property, value.clone());
            }
        }
        self
    }

    /// Invoke `method` on every element exposing it
    ///
    /// Calls to shareable methods are also recorded and replayed by a
    /// `Tracker` on elements that join the collection later. Listeners and
    /// custom methods run with the host released, so they may use this
    /// collection or the host themselves.
    pub fn call(&self, method: &str, args: Vec<Arg>) -> &Self {
        for element in self.elements() {
            let pending = self.host.borrow_mut().begin_call(element, method, &args);
            if let Some(pending) = pending {
                pending.run();
            }
        }

        if self.config.is_shareable(method) {
            tracing::trace!("recording shareable call '{}'", method);
            self.members.borrow_mut().shared.push(MethodRecord {
                name: method.to_string(),
                args,
            });
        }

        self
    }

    /// Add `listener` for `event` on every element supporting the event
    pub fn on(&self, event: &str, listener: &Listener) -> &Self {
        let marker = self.config.event_property(event);
        let elements = self.elements();
        let mut host = self.host.borrow_mut();
        for element in elements {
            if host.has_property(element, &marker) {
                host.add_event_listener(element, event, listener);
            }
        }
        self
    }

    /// Remove a listener previously added for `event`
    pub fn off(&self, event: &str, listener: &Listener) -> &Self {
        let marker = self.config.event_property(event);
        let elements = self.elements();
        let mut host = self.host.borrow_mut();
        for element in elements {
            if host.has_property(element, &marker) {
                host.remove_event_listener(element, event, listener);
            }
        }
        self
    }
}
