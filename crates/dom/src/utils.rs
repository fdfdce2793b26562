//! Utility functions for document processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};

/// Concatenated character data of all text descendants
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let node = arena.get(node_id)?;
    if matches!(node.node_type, NodeType::Text | NodeType::Comment) {
        return Ok(node.node_value.clone());
    }

    let mut text = String::new();
    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text)
}

/// Escape character data for HTML output
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for use inside double quotes
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
