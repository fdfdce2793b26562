//! In-memory document tree for bulk element collections
//!
//! A small, arena-backed document that offers what a collection library
//! needs from its host:
//!
//! - Selector queries in document order and single-node matching
//! - Named element properties and methods, looked up by name
//! - Event listeners compared by identity, run after the document borrow
//!   is released
//! - Child-list mutation records delivered in batches
//!
//! ## Core Design
//!
//! ```text
//! JSON description → Document (DomArena) → query / mutate
//!                                   ↓
//!                        MutationBatch (broadcast) → subscribers
//! ```

pub mod arena;
pub mod builder;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod mutation;
pub mod selector;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use dispatch::{Dispatch, PendingCall};
pub use document::{value_to_string, Document, DocumentConfig};
pub use error::{DomError, Result};
pub use mutation::{MutationBatch, MutationRecord, MutationType};
pub use selector::SelectorList;
pub use types::*;
