//! Mutation records and batches
//!
//! The document records child-list changes as they happen and hands them
//! out as one `MutationBatch` per flush, the way a browser delivers a
//! MutationObserver callback after the current task settles.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationType {
    ChildList,
}

/// A single child-list change under `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord<N = NodeId> {
    pub mutation_type: MutationType,
    pub target: N,
    pub added_nodes: SmallVec<[N; 2]>,
    pub removed_nodes: SmallVec<[N; 2]>,
    pub previous_sibling: Option<N>,
    pub next_sibling: Option<N>,
}

impl<N: Copy> MutationRecord<N> {
    pub fn added(target: N, node: N, previous_sibling: Option<N>, next_sibling: Option<N>) -> Self {
        let mut added_nodes = SmallVec::new();
        added_nodes.push(node);
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes,
            removed_nodes: SmallVec::new(),
            previous_sibling,
            next_sibling,
        }
    }

    pub fn removed(
        target: N,
        node: N,
        previous_sibling: Option<N>,
        next_sibling: Option<N>,
    ) -> Self {
        let mut removed_nodes = SmallVec::new();
        removed_nodes.push(node);
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: SmallVec::new(),
            removed_nodes,
            previous_sibling,
            next_sibling,
        }
    }
}

/// Records delivered together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch<N = NodeId> {
    /// Monotonic per document, starting at 1
    pub sequence: u64,
    pub records: Vec<MutationRecord<N>>,
}

impl<N: Copy> MutationBatch<N> {
    pub fn added_nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.records
            .iter()
            .flat_map(|r| r.added_nodes.iter().copied())
    }

    pub fn removed_nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.records
            .iter()
            .flat_map(|r| r.removed_nodes.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
