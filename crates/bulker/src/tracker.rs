//! Live membership tracking
//!
//! A `Tracker` owns a registry of collections and one subscription to the
//! host's mutation batches. For every batch:
//!
//! - an added element joins the FIRST registered collection with a selector
//!   matching the element itself, and every shareable call recorded on that
//!   collection is replayed on it in order;
//! - a removed element leaves the first matching collection (one occurrence).
//!
//! Descendants of an inserted subtree are not matched, only its root.
//!
//! Registry entries hold weak references: once every handle to a collection
//! is dropped its entry goes inert and is pruned on the next batch.

use crate::collection::{Collection, Members};
use crate::config::BulkerConfig;
use crate::entity::Entity;
use crate::error::{BulkError, Result};
use crate::host::Host;
use crate::resolver::Resolver;
use bulker_dom::MutationBatch;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

/// Handle returned by `Tracker::register`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Subscription<E> {
    id: SubscriptionId,
    members: Weak<RefCell<Members<E>>>,
}

pub struct Tracker<H: Host> {
    host: Rc<RefCell<H>>,
    config: Rc<BulkerConfig>,
    subscriptions: Vec<Subscription<H::Element>>,
    receiver: broadcast::Receiver<MutationBatch<H::Element>>,
}

impl<H: Host> Tracker<H> {
    /// Subscribe to the host's mutations; batches flushed before this call are not seen
    pub(crate) fn new(host: Rc<RefCell<H>>, config: Rc<BulkerConfig>) -> Self {
        let receiver = host.borrow().subscribe_mutations();
        Self {
            host,
            config,
            subscriptions: Vec::new(),
            receiver,
        }
    }

    /// Build a collection from one selector and start tracking it
    ///
    /// Any input other than a selector string is rejected before resolution.
    pub fn track(&mut self, selector: impl Into<Entity<H>>) -> Result<Collection<H>> {
        let entity = selector.into();
        if !matches!(entity, Entity::Selector(_)) {
            return Err(BulkError::NotASelector(entity.kind()));
        }

        let members = {
            let host = self.host.borrow();
            let mut resolver = Resolver::new(&*host);
            resolver.resolve(&entity)?;
            resolver.finish()
        };

        let collection =
            Collection::from_members(Rc::clone(&self.host), Rc::clone(&self.config), members);
        self.register(&collection);
        Ok(collection)
    }

    /// Start tracking an existing collection; registering twice returns the same id
    pub fn register(&mut self, collection: &Collection<H>) -> SubscriptionId {
        if let Some(existing) = self.subscription_of(collection) {
            return existing;
        }

        let id = SubscriptionId::new();
        if collection.selectors().is_empty() {
            tracing::debug!("Registered collection {} without selectors; it will not grow", id);
        } else {
            tracing::debug!(
                "Registered collection {} for '{}'",
                id,
                collection.selectors().join(", ")
            );
        }
        self.subscriptions.push(Subscription {
            id,
            members: Rc::downgrade(collection.members()),
        });
        id
    }

    /// Stop tracking; false when `id` is unknown
    pub fn unregister(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        let removed = self.subscriptions.len() != before;
        if removed {
            tracing::debug!("Unregistered collection {}", id);
        }
        removed
    }

    pub fn subscription_of(&self, collection: &Collection<H>) -> Option<SubscriptionId> {
        self.subscriptions
            .iter()
            .find(|s| {
                s.members
                    .upgrade()
                    .is_some_and(|m| Rc::ptr_eq(&m, collection.members()))
            })
            .map(|s| s.id)
    }

    pub fn is_tracking(&self, collection: &Collection<H>) -> bool {
        self.subscription_of(collection).is_some()
    }

    /// Registered collections that are still alive
    pub fn len(&self) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.members.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply one mutation batch; returns the number of membership changes
    pub fn apply(&mut self, batch: &MutationBatch<H::Element>) -> usize {
        self.subscriptions.retain(|s| s.members.strong_count() > 0);

        let mut changes = 0;
        for record in &batch.records {
            for &node in &record.added_nodes {
                if self.add_node(node) {
                    changes += 1;
                }
            }
            for &node in &record.removed_nodes {
                if self.remove_node(node) {
                    changes += 1;
                }
            }
        }

        tracing::debug!(
            "Applied mutation batch {} ({} records, {} changes)",
            batch.sequence,
            batch.records.len(),
            changes
        );
        changes
    }

    /// Apply every batch delivered so far, oldest first; returns how many were applied
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(batch) => {
                    self.apply(&batch);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Tracker fell behind, {} mutation batches dropped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Wait for the next batch and apply it; None once the host is gone
    pub async fn next_batch(&mut self) -> Option<u64> {
        loop {
            match self.receiver.recv().await {
                Ok(batch) => {
                    self.apply(&batch);
                    return Some(batch.sequence);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Tracker fell behind, {} mutation batches dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn first_match(&self, node: H::Element) -> Option<Rc<RefCell<Members<H::Element>>>> {
        let host = self.host.borrow();
        if !host.is_element(node) {
            return None;
        }
        self.subscriptions
            .iter()
            .filter_map(|s| s.members.upgrade())
            .find(|members| {
                members
                    .borrow()
                    .selectors
                    .iter()
                    .any(|selector| host.matches(node, selector))
            })
    }

    fn add_node(&mut self, node: H::Element) -> bool {
        let Some(members) = self.first_match(node) else {
            return false;
        };

        let replay = {
            let mut members = members.borrow_mut();
            members.elements.push(node);
            members.shared.clone()
        };

        for record in &replay {
            tracing::trace!("replaying '{}' on {:?}", record.name, node);
            // Elements lacking the method opt out
            let pending = self.host.borrow_mut().begin_call(node, &record.name, &record.args);
            if let Some(pending) = pending {
                pending.run();
            }
        }
        true
    }

    fn remove_node(&mut self, node: H::Element) -> bool {
        let Some(members) = self.first_match(node) else {
            return false;
        };

        let mut members = members.borrow_mut();
        match members.elements.iter().position(|&e| e == node) {
            Some(index) => {
                members.elements.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bulker;
    use bulker_dom::{Arg, Document, Listener, NodeId};
    use serde_json::json;
    use std::cell::Cell;

    fn document() -> Document {
        Document::from_json(&json!([
            { "tag": "ul", "attrs": { "id": "list" }, "children": [
                { "tag": "li", "attrs": { "class": "item" } },
                { "tag": "li", "attrs": { "class": "item" } }
            ]}
        ]))
        .unwrap()
    }

    fn bulker() -> Bulker<Document> {
        Bulker::new(document())
    }

    fn append_item(bulker: &Bulker<Document>, class: &str) -> NodeId {
        let mut doc = bulker.host().borrow_mut();
        let list = doc.get_element_by_id("list").unwrap();
        doc.append_json(list, &json!({ "tag": "li", "attrs": { "class": class } }))
            .unwrap()[0]
    }

    fn flush(bulker: &Bulker<Document>) {
        bulker.host().borrow_mut().flush_mutations();
    }

    #[test]
    fn test_track_rejects_non_selector() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();

        let err = tracker.track(NodeId(1)).unwrap_err();
        assert!(matches!(err, BulkError::NotASelector("element")));
        assert!(matches!(
            tracker.track(Entity::<Document>::Array(vec![])),
            Err(BulkError::NotASelector("array"))
        ));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_added_node_joins_and_replays() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();
        assert_eq!(items.len(), 2);

        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let handler = Listener::new(move |_| counter.set(counter.get() + 1));
        items.call("addEventListener", vec!["click".into(), Arg::from(&handler)]);

        let third = append_item(&bulker, "item");
        let ignored = append_item(&bulker, "other");
        assert_eq!(items.len(), 2);

        flush(&bulker);
        assert_eq!(tracker.pump(), 1);

        assert_eq!(items.len(), 3);
        assert!(items.contains(third));
        assert!(!items.contains(ignored));

        bulker.host().borrow().dispatch_event(third, "click");
        bulker.host().borrow().dispatch_event(ignored, "click");
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_replayed_listener_may_read_collection() {
        let config = BulkerConfig {
            shareable_methods: vec!["addEventListener".to_string(), "click".to_string()],
            ..Default::default()
        };
        let bulker = Bulker::with_config(document(), config).unwrap();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();

        let sizes = Rc::new(RefCell::new(Vec::new()));
        let (handle, log) = (items.clone(), sizes.clone());
        let listener = Listener::new(move |_| log.borrow_mut().push(handle.len()));
        items
            .call("addEventListener", vec!["click".into(), listener.into()])
            .call("click", vec![]);
        assert_eq!(*sizes.borrow(), vec![2, 2]);

        append_item(&bulker, "item");
        flush(&bulker);
        tracker.pump();

        // Replay: listener added, then the recorded click fires it
        assert_eq!(*sizes.borrow(), vec![2, 2, 3]);
    }

    #[test]
    fn test_removed_node_leaves_once() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();
        let first = items.elements()[0];

        bulker.host().borrow_mut().remove(first).unwrap();
        flush(&bulker);
        tracker.pump();

        assert_eq!(items.len(), 1);
        assert!(!items.contains(first));
    }

    #[test]
    fn test_removing_untracked_member_is_noop() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();
        let before = items.elements();

        // Inserted and removed while the tracker was not looking
        let extra = append_item(&bulker, "item");
        bulker.host().borrow_mut().take_records();
        bulker.host().borrow_mut().remove(extra).unwrap();
        flush(&bulker);
        tracker.pump();

        assert_eq!(items.elements(), before);
    }

    #[test]
    fn test_only_first_matching_collection_grows() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let first = tracker.track("li").unwrap();
        let second = tracker.track(".item").unwrap();

        append_item(&bulker, "item");
        flush(&bulker);
        tracker.pump();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_unregister_and_drop() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let kept = tracker.track(".item").unwrap();
        let id = tracker.subscription_of(&kept).unwrap();
        assert_eq!(tracker.register(&kept), id);

        let dropped = tracker.track("li").unwrap();
        assert_eq!(tracker.len(), 2);
        drop(dropped);
        assert_eq!(tracker.len(), 1);

        assert!(tracker.unregister(id));
        assert!(!tracker.unregister(id));
        assert!(!tracker.is_tracking(&kept));

        append_item(&bulker, "item");
        flush(&bulker);
        tracker.pump();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_subtree_descendants_are_not_matched() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();

        {
            let mut doc = bulker.host().borrow_mut();
            let body = doc.body();
            doc.append_json(
                body,
                &json!({ "tag": "div", "children": [{ "tag": "li", "attrs": { "class": "item" } }] }),
            )
            .unwrap();
            doc.flush_mutations();
        }
        tracker.pump();

        assert_eq!(items.len(), 2);
        assert_eq!(bulker.host().borrow().query_selector_all(".item").unwrap().len(), 3);
    }

    #[test]
    fn test_next_batch_async() {
        let bulker = bulker();
        let mut tracker = bulker.tracker();
        let items = tracker.track(".item").unwrap();

        append_item(&bulker, "item");
        flush(&bulker);

        let sequence = tokio_test::block_on(tracker.next_batch());
        assert_eq!(sequence, Some(1));
        assert_eq!(items.len(), 3);
    }
}
