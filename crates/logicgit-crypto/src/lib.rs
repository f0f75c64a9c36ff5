//! Canonical serialization and content hashing for logicgit.
//!
//! Two logically-equal values always canonicalize to the same bytes, and the
//! same `(kind, canonical bytes)` pair always hashes to the same
//! [`ContentHash`](logicgit_types::ContentHash). Both operations are pure.
//!
//! The hash scheme is git-shaped: a header of `"<kind> <length>\0"` is
//! prepended to the canonical bytes before digesting with BLAKE3.

pub mod canonical;
pub mod hasher;

pub use canonical::{canonical_bytes, canonicalize, canonicalize_value};
pub use hasher::{ContentHasher, HasherError};
