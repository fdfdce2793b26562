//! Error types for document operations
//!
//! Flat hierarchy. Missing properties or methods are not errors; they are
//! reported as `None` by the document API.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid selector: '{0}'")]
    InvalidSelector(String),

    #[error("Hierarchy request error: cannot insert {child} into {parent}")]
    HierarchyRequest { parent: u32, child: u32 },

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: u32, child: u32 },

    #[error("Invalid tree description: {0}")]
    InvalidTree(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
