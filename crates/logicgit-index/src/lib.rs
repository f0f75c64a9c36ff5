//! Relational index for logicgit.
//!
//! The index is a lookup layer over hashes the rest of the system already
//! computed. It holds four tables:
//!
//! - `objects` — one row per stored object; the index half of the
//!   dual-write object store (see [`logicgit_store::DualObjectStore`])
//! - `executions` — execution summary fields plus commit linkage
//! - `audit_trail` — one row per fired rule, in application order
//! - `state_snapshots` — final states keyed by execution hash
//!
//! Backends implement [`ExecutionIndex`] and [`ObjectTarget`](logicgit_store::ObjectTarget):
//!
//! - [`SqliteIndex`] — the on-disk index (`.logicgit/index.db`)
//! - [`InMemoryIndex`] — `Vec`/`HashMap` backed, for tests and embedding

pub mod error;
pub mod memory;
pub mod migration;
pub mod record;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndex;
pub use record::{AuditRecord, ExecutionBundle, ExecutionRecord, SnapshotKind, SnapshotRecord};
pub use sqlite::SqliteIndex;
pub use traits::{validate_prefix, ExecutionIndex};
