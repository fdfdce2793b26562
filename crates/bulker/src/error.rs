//! Error types for collection construction
//!
//! Operations on a built collection never fail: an element that lacks a
//! property, method or event simply opts out.

use bulker_dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BulkError>;

#[derive(Debug, Error)]
pub enum BulkError {
    #[error(
        "First argument must be a string containing one or more CSS selectors separated by commas, got {0}"
    )]
    NotASelector(&'static str),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
