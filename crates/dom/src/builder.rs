//! Build document trees from a JSON description
//!
//! Input format:
//! ```json
//! [
//!   { "tag": "ul", "attrs": { "id": "list" }, "children": [
//!     { "tag": "li", "attrs": { "class": "item" }, "text": "One" },
//!     "bare strings become text nodes"
//!   ]}
//! ]
//! ```
//! `props` sets element properties (stored or expando) after creation.

use crate::document::{value_to_string, Document};
use crate::error::{DomError, Result};
use crate::types::{NodeId, Value};

impl Document {
    /// Document whose body holds the described nodes, with no pending mutations
    pub fn from_json(description: &Value) -> Result<Self> {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_json(body, description)?;
        doc.take_records();
        Ok(doc)
    }

    pub fn from_json_str(description: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(description)?;
        Self::from_json(&value)
    }

    /// Build the described subtree detached, then append its roots to `parent`
    ///
    /// Each root produces exactly one mutation record when `parent` is connected.
    pub fn append_json(&mut self, parent: NodeId, description: &Value) -> Result<Vec<NodeId>> {
        let roots = self.build_json(description)?;
        for &root in &roots {
            self.append_child(parent, root)?;
        }
        Ok(roots)
    }

    /// Build the described nodes without attaching them
    pub fn build_json(&mut self, description: &Value) -> Result<Vec<NodeId>> {
        match description {
            Value::Array(items) => {
                let mut roots = Vec::with_capacity(items.len());
                for item in items {
                    roots.extend(self.build_json(item)?);
                }
                Ok(roots)
            }
            _ => Ok(vec![self.build_node(description)?]),
        }
    }

    fn build_node(&mut self, description: &Value) -> Result<NodeId> {
        let object = match description {
            Value::String(text) => return Ok(self.create_text_node(text)),
            Value::Object(object) => object,
            other => {
                return Err(DomError::InvalidTree(format!(
                    "expected object or string, got {}",
                    other
                )))
            }
        };

        let tag = object
            .get("tag")
            .and_then(Value::as_str)
            .ok_or_else(|| DomError::InvalidTree("missing 'tag'".to_string()))?;
        let element = self.create_element(tag);

        if let Some(attrs) = object.get("attrs") {
            let attrs = attrs
                .as_object()
                .ok_or_else(|| DomError::InvalidTree("'attrs' must be an object".to_string()))?;
            for (name, value) in attrs {
                self.set_attribute(element, name, &value_to_string(value))?;
            }
        }

        if let Some(text) = object.get("text").and_then(Value::as_str) {
            let text_node = self.create_text_node(text);
            self.append_child(element, text_node)?;
        }

        if let Some(children) = object.get("children") {
            if !children.is_array() {
                return Err(DomError::InvalidTree(
                    "'children' must be an array".to_string(),
                ));
            }
            for child in self.build_json(children)? {
                self.append_child(element, child)?;
            }
        }

        if let Some(props) = object.get("props").and_then(Value::as_object) {
            for (name, value) in props {
                if !self.set_property(element, name, value.clone()) {
                    self.define_property(element, name, value.clone())?;
                }
            }
        }

        Ok(element)
    }
}
