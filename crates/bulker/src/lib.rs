//! Bulk element collections
//!
//! Treat a heterogeneous list of elements, node lists, selectors and prior
//! collections as one ordered, duplicate-free set, then read, write, call
//! and listen on every member at once.
//!
//! # Design
//!
//! 1. **One host seam**: everything document-specific lives behind `Host`
//! 2. **No special-case failures**: members lacking a property, method or
//!    event simply opt out
//! 3. **Explicit tracking**: a `Tracker` holds the registry of live
//!    collections and applies mutation batches when asked
//!
//! ```text
//! Entities → Resolver → Collection ──get/set/call/on/off──→ Host
//!                           ↑
//!          Tracker ← MutationBatch (broadcast) ← Host
//! ```

pub mod bulker;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod host;
pub mod resolver;
pub mod tracker;

pub use bulker::Bulker;
pub use collection::{Collection, MethodRecord, Values};
pub use config::BulkerConfig;
pub use entity::Entity;
pub use error::{BulkError, Result};
pub use host::Host;
pub use resolver::Resolver;
pub use tracker::{SubscriptionId, Tracker};

pub use bulker_dom::{Arg, Document, Listener, Method, NodeId, Value};
