//! Arena-based node storage
//!
//! Nodes are never freed: a removed node keeps its slot (and its id), so a
//! handle held by a collection stays valid after the node leaves the tree.
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ NodeId(u32) index, not a pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for document nodes
#[derive(Debug)]
pub struct DomArena {
    nodes: Vec<DomNode>,
}

impl DomArena {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Id the next `add_node` call will hand out
    pub fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    /// Store `node` in the next slot; its `node_id` is overwritten with the slot index
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.next_id();
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id.index())
            .ok_or(DomError::NodeNotFound(node_id.0))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id.index())
            .ok_or(DomError::NodeNotFound(node_id.0))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        node_id.index() < self.nodes.len()
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self, node_id: NodeId) -> Ancestors<'_> {
        let next = self.get(node_id).ok().and_then(|n| n.parent_id);
        Ancestors { arena: self, next }
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Pre-order walk from `start_id`, children left to right
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Element descendants of `start_id` in document order, excluding `start_id`
    pub fn descendant_elements(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.node_id != start_id && node.node_type == NodeType::Element {
                found.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(found)
    }

}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    arena: &'a DomArena,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena.get(current).ok().and_then(|n| n.parent_id);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(arena: &mut DomArena, parent: NodeId, child: NodeId) {
        arena.get_mut(parent).unwrap().children_ids.push(child);
        arena.get_mut(child).unwrap().parent_id = Some(parent);
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();

        let id = arena.add_node(DomNode::element(NodeId(99), "div"));
        assert_eq!(id, NodeId(0));

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, id);
        assert!(matches!(
            arena.get(NodeId(7)),
            Err(DomError::NodeNotFound(7))
        ));
    }

    #[test]
    fn test_traverse_df() {
        let mut arena = DomArena::new();

        // Create tree: div -> [span -> [b], span]
        let root = arena.add_node(DomNode::element(NodeId(0), "div"));
        let first = arena.add_node(DomNode::element(NodeId(0), "span"));
        let second = arena.add_node(DomNode::element(NodeId(0), "span"));
        let bold = arena.add_node(DomNode::element(NodeId(0), "b"));
        link(&mut arena, root, first);
        link(&mut arena, root, second);
        link(&mut arena, first, bold);

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "b", "span"]);
        assert_eq!(
            arena.descendant_elements(root).unwrap(),
            vec![first, bold, second]
        );
    }

    #[test]
    fn test_ancestors() {
        let mut arena = DomArena::new();
        let a = arena.add_node(DomNode::element(NodeId(0), "section"));
        let b = arena.add_node(DomNode::element(NodeId(0), "ul"));
        let c = arena.add_node(DomNode::element(NodeId(0), "li"));
        link(&mut arena, a, b);
        link(&mut arena, b, c);

        assert_eq!(arena.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
        assert!(arena.is_inclusive_ancestor(a, c));
        assert!(arena.is_inclusive_ancestor(c, c));
        assert!(!arena.is_inclusive_ancestor(c, a));
    }
}
