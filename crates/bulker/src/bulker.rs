//! Collection factory
//!
//! Owns the shared host handle and configuration every collection and
//! tracker built from it works against.

use crate::collection::Collection;
use crate::config::BulkerConfig;
use crate::entity::Entity;
use crate::error::Result;
use crate::host::Host;
use crate::resolver::Resolver;
use crate::tracker::Tracker;
use std::cell::RefCell;
use std::rc::Rc;

pub struct Bulker<H: Host> {
    host: Rc<RefCell<H>>,
    config: Rc<BulkerConfig>,
}

impl<H: Host> Clone for Bulker<H> {
    fn clone(&self) -> Self {
        Self {
            host: Rc::clone(&self.host),
            config: Rc::clone(&self.config),
        }
    }
}

impl<H: Host> Bulker<H> {
    pub fn new(host: H) -> Self {
        Self {
            host: Rc::new(RefCell::new(host)),
            config: Rc::new(BulkerConfig::default()),
        }
    }

    pub fn with_config(host: H, config: BulkerConfig) -> Result<Self> {
        Self::from_shared(Rc::new(RefCell::new(host)), config)
    }

    /// Work against a host the caller keeps a handle to
    pub fn from_shared(host: Rc<RefCell<H>>, config: BulkerConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            "Bulker ready, shareable methods: {:?}",
            config.shareable_methods
        );
        Ok(Self {
            host,
            config: Rc::new(config),
        })
    }

    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    pub fn config(&self) -> &BulkerConfig {
        &self.config
    }

    /// Resolve `entities` into a new collection
    ///
    /// Fails only when a selector cannot be parsed by the host.
    pub fn collect(&self, entities: impl IntoIterator<Item = Entity<H>>) -> Result<Collection<H>> {
        let entities: Vec<Entity<H>> = entities.into_iter().collect();
        let members = {
            let host = self.host.borrow();
            let mut resolver = Resolver::new(&*host);
            resolver.resolve_all(&entities)?;
            resolver.finish()
        };
        tracing::trace!(
            "collected {} elements from {} inputs",
            members.elements.len(),
            entities.len()
        );
        Ok(Collection::from_members(
            Rc::clone(&self.host),
            Rc::clone(&self.config),
            members,
        ))
    }

    /// A tracker subscribed to the host's mutations from now on
    pub fn tracker(&self) -> Tracker<H> {
        Tracker::new(Rc::clone(&self.host), Rc::clone(&self.config))
    }
}

/// Build a collection from any mix of inputs
///
/// ```ignore
/// let items = bulk!(bulker; ".item", first_node, vec![a, b])?;
/// ```
#[macro_export]
macro_rules! bulk {
    ($bulker:expr; $($entity:expr),* $(,)?) => {
        $bulker.collect(::std::vec![$(::std::convert::Into::into($entity)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BulkError;
    use bulker_dom::Document;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_json(&json!([
            { "tag": "div", "attrs": { "id": "a", "class": "box" } },
            { "tag": "div", "attrs": { "id": "b", "class": "box" } },
            "loose text"
        ]))
        .unwrap()
    }

    #[test]
    fn test_collect_mixed_inputs() {
        let bulker = Bulker::new(doc());
        let a = bulker.host().borrow().get_element_by_id("a").unwrap();

        let boxes = bulk!(bulker; a, ".box", None::<&str>).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.first(), Some(a));
        assert_eq!(&*boxes.selectors(), &[".box".to_string()]);

        let merged = bulk!(bulker; &boxes, "#b").unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(&*merged.selectors(), &[".box".to_string(), "#b".to_string()]);
    }

    #[test]
    fn test_empty_and_invalid() {
        let bulker = Bulker::new(doc());
        assert!(bulk!(bulker;).unwrap().is_empty());
        assert!(matches!(
            bulker.collect(vec!["div[".into()]),
            Err(BulkError::Dom(_))
        ));
    }

    #[test]
    fn test_with_config() {
        let config = BulkerConfig {
            shareable_methods: vec!["setAttribute".to_string()],
            ..Default::default()
        };
        let bulker = Bulker::with_config(doc(), config).unwrap();
        let boxes = bulker.collect(vec![".box".into()]).unwrap();

        boxes.call("setAttribute", vec!["data-x".into(), "1".into()]);
        assert_eq!(boxes.shared_methods().len(), 1);

        let invalid = BulkerConfig {
            event_property_prefix: String::new(),
            ..Default::default()
        };
        assert!(Bulker::with_config(doc(), invalid).is_err());
    }

    #[test]
    fn test_shared_host() {
        let host = Rc::new(RefCell::new(doc()));
        let bulker = Bulker::from_shared(Rc::clone(&host), BulkerConfig::default()).unwrap();
        let body = host.borrow().body();
        host.borrow_mut()
            .append_json(body, &json!({ "tag": "div", "attrs": { "class": "box" } }))
            .unwrap();
        assert_eq!(bulker.collect(vec![".box".into()]).unwrap().len(), 3);
    }
}
