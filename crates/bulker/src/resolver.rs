//! Entity resolution
//!
//! Flattens a heterogeneous input list into an ordered, duplicate-free
//! element list, depth-first and left-to-right. Selector strings are queried
//! against the host and remembered for later re-matching.
//!
//! Merging a prior collection appends its members without the identity
//! check applied to direct elements and selector results.

use crate::collection::Members;
use crate::entity::Entity;
use crate::error::Result;
use crate::host::Host;
use ahash::AHashSet;

pub struct Resolver<'a, H: Host> {
    host: &'a H,
    elements: Vec<H::Element>,
    seen: AHashSet<H::Element>,
    selectors: Vec<String>,
}

impl<'a, H: Host> Resolver<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self {
            host,
            elements: Vec::new(),
            seen: AHashSet::new(),
            selectors: Vec::new(),
        }
    }

    /// Resolve every input in order
    pub fn resolve_all<'e>(&mut self, entities: impl IntoIterator<Item = &'e Entity<H>>) -> Result<()>
    where
        H: 'e,
    {
        for entity in entities {
            self.resolve(entity)?;
        }
        Ok(())
    }

    /// Resolve one input, recursing into nested inputs
    ///
    /// Fails only for a selector the host cannot parse.
    pub fn resolve(&mut self, entity: &Entity<H>) -> Result<()> {
        match entity {
            Entity::Element(element) => self.push_unique(*element),
            Entity::Elements(list) => {
                for &element in list {
                    self.push_unique(element);
                }
            }
            Entity::Array(items) => {
                for item in items {
                    self.resolve(item)?;
                }
            }
            Entity::Selector(selector) => {
                let matched = self.host.query_selector_all(selector)?;
                tracing::trace!("selector '{}' matched {} elements", selector, matched.len());
                if !self.selectors.iter().any(|s| s == selector) {
                    self.selectors.push(selector.clone());
                }
                for element in matched {
                    self.push_unique(element);
                }
            }
            Entity::Collection(collection) => {
                let members = collection.members().borrow();
                self.elements.extend(members.elements.iter().copied());
                self.seen.extend(members.elements.iter().copied());
                for selector in &members.selectors {
                    if !self.selectors.contains(selector) {
                        self.selectors.push(selector.clone());
                    }
                }
            }
            Entity::Other => {}
        }
        Ok(())
    }

    fn push_unique(&mut self, element: H::Element) {
        if self.host.is_element(element) && self.seen.insert(element) {
            self.elements.push(element);
        }
    }

    pub fn elements(&self) -> &[H::Element] {
        &self.elements
    }

    pub(crate) fn finish(self) -> Members<H::Element> {
        Members {
            elements: self.elements,
            selectors: self.selectors,
            shared: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bulker;
    use bulker_dom::{Document, NodeId};
    use serde_json::json;

    fn doc() -> Document {
        Document::from_json(&json!([
            { "tag": "ul", "children": [
                { "tag": "li", "attrs": { "class": "item", "id": "one" } },
                { "tag": "li", "attrs": { "class": "item", "id": "two" } },
                { "tag": "li", "attrs": { "class": "other", "id": "three" } }
            ]}
        ]))
        .unwrap()
    }

    fn id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    fn resolve(doc: &Document, entities: &[Entity<Document>]) -> Vec<NodeId> {
        let mut resolver = Resolver::new(doc);
        resolver.resolve_all(entities).unwrap();
        resolver.elements().to_vec()
    }

    #[test]
    fn test_depth_first_order() {
        let doc = doc();
        let (one, two, three) = (id(&doc, "one"), id(&doc, "two"), id(&doc, "three"));

        let result = resolve(
            &doc,
            &[
                three.into(),
                Entity::Array(vec![".item".into(), Entity::Array(vec![three.into()])]),
            ],
        );
        assert_eq!(result, vec![three, one, two]);
    }

    #[test]
    fn test_dedup_across_paths() {
        let doc = doc();
        let (one, two) = (id(&doc, "one"), id(&doc, "two"));

        let result = resolve(
            &doc,
            &[
                one.into(),
                "li".into(),
                vec![two, one].into(),
                ".item".into(),
            ],
        );
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], one);
    }

    #[test]
    fn test_ignored_inputs() {
        let doc = doc();
        let mut resolver = Resolver::new(&doc);
        resolver
            .resolve_all(&[
                Entity::Other,
                ".nothing".into(),
                Entity::from(None::<NodeId>),
                Entity::Element(NodeId(4242)),
                Entity::Element(doc.root()),
            ])
            .unwrap();
        let members = resolver.finish();
        assert!(members.elements.is_empty());
        assert_eq!(members.selectors, vec![".nothing".to_string()]);
    }

    #[test]
    fn test_merged_collection_keeps_duplicates() {
        let bulker = Bulker::new(doc());
        let items = bulker.collect(vec![".item".into()]).unwrap();
        let one = items.elements()[0];

        let merged = bulker
            .collect(vec![(&items).into(), (&items).into(), one.into(), ".item".into()])
            .unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.elements(), [items.elements(), items.elements()].concat());
        assert_eq!(&*merged.selectors(), &[".item".to_string()]);

        let single = Bulker::new(
            Document::from_json(&json!({ "tag": "p", "attrs": { "class": "only" } })).unwrap(),
        );
        let only = single.collect(vec![".only".into()]).unwrap();
        assert_eq!(single.collect(vec![(&only).into(), (&only).into()]).unwrap().len(), 2);
    }

    #[test]
    fn test_selectors_recorded_once() {
        let doc = doc();
        let mut resolver = Resolver::new(&doc);
        resolver
            .resolve_all(&[".item".into(), "li".into(), ".item".into()])
            .unwrap();
        assert_eq!(resolver.finish().selectors, vec![".item", "li"]);
    }

    #[test]
    fn test_invalid_selector_fails() {
        let doc = doc();
        let mut resolver = Resolver::new(&doc);
        assert!(resolver.resolve(&"li::before".into()).is_err());
    }
}
