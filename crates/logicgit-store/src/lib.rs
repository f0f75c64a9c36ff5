//! Content-addressed object storage for logicgit.
//!
//! Every hashed payload (commits, final states, rule sets) is persisted as an
//! immutable [`StoredObject`] keyed by its [`ContentHash`](logicgit_types::ContentHash).
//!
//! # Storage Layout
//!
//! An object lives in two places at once: a relational index row and a
//! loose file under `.logicgit/objects/<2 hex>/<62 hex>`. Each place is an
//! [`ObjectTarget`]; [`DualObjectStore`] puts the two behind one
//! [`ObjectStore::put`] and keeps them consistent.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written. Re-putting an existing hash is a no-op.
//! 2. A put lands in both targets or in neither. A half-written object is
//!    rolled back; a failed rollback is surfaced as [`StoreError::Inconsistent`].
//! 3. Reads verify the hash of what they return.
//! 4. The store never interprets object contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod dual;
pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use blob::FsBlobArea;
pub use dual::DualObjectStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::StoredObject;
pub use traits::{ObjectStore, ObjectTarget};
