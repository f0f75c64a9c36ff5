//! Foundation types for logicgit.
//!
//! Every other logicgit crate depends on `logicgit-types`. The types here are
//! plain data: they carry no storage or hashing logic of their own.
//!
//! # Key Types
//!
//! - [`ContentHash`] — content-addressed identifier (hex-encoded BLAKE3 digest)
//! - [`ObjectKind`] — the kind tag folded into every object hash header
//! - [`Commit`] — parent-linked wrapper around one execution
//! - [`Record`] — schema-free business state (a JSON value tree)

pub mod commit;
pub mod error;
pub mod hash;
pub mod kind;

pub use commit::{Commit, DEFAULT_AUTHOR};
pub use error::TypeError;
pub use hash::ContentHash;
pub use kind::ObjectKind;

/// Business state: an arbitrary tree of mappings, sequences, and scalars.
pub type Record = serde_json::Value;
