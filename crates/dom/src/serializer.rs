//! HTML serializer
//!
//! Backs the `innerHTML` / `outerHTML` element properties. Attributes are
//! written in name order so output is stable across runs.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils::{escape_attr, escape_text};

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Serialize a node and its subtree
pub fn outer_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::with_capacity(256);
    serialize_node(arena, node_id, &mut output)?;
    Ok(output)
}

/// Serialize the children of a node
pub fn inner_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::with_capacity(256);
    for &child_id in &arena.get(node_id)?.children_ids {
        serialize_node(arena, child_id, &mut output)?;
    }
    Ok(output)
}

fn serialize_node(arena: &DomArena, node_id: NodeId, output: &mut String) -> Result<()> {
    let node = arena.get(node_id)?;

    match node.node_type {
        NodeType::Element => {
            output.push('<');
            output.push_str(&node.node_name);

            let mut attrs: Vec<_> = node.attributes.iter().collect();
            attrs.sort();
            for (name, value) in attrs {
                output.push(' ');
                output.push_str(name);
                output.push_str("=\"");
                output.push_str(&escape_attr(value));
                output.push('"');
            }
            output.push('>');

            if VOID_ELEMENTS.contains(&node.node_name.as_str()) {
                return Ok(());
            }

            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, output)?;
            }

            output.push_str("</");
            output.push_str(&node.node_name);
            output.push('>');
        }
        NodeType::Text => output.push_str(&escape_text(&node.node_value)),
        NodeType::Comment => {
            output.push_str("<!--");
            output.push_str(&node.node_value);
            output.push_str("-->");
        }
        NodeType::Document => {
            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, output)?;
            }
        }
    }

    Ok(())
}
