use logicgit_types::ContentHash;

use crate::error::{IndexError, IndexResult};
use crate::record::{AuditRecord, ExecutionBundle, ExecutionRecord, SnapshotKind, SnapshotRecord};

/// Storage interface for execution history.
///
/// Implementations must:
/// - write a whole [`ExecutionBundle`] or nothing;
/// - treat audit entries and snapshots as keyed by execution hash, so
///   re-recording an identical execution under a new commit does not
///   duplicate them;
/// - order prefix matches most recent first.
pub trait ExecutionIndex: Send + Sync {
    /// Persist an execution row with its audit trail and final snapshot.
    ///
    /// The bundle's `execution.seq` is ignored; the index assigns it.
    fn record(&self, bundle: &ExecutionBundle) -> IndexResult<()>;

    /// The execution recorded by a given commit.
    fn execution_for_commit(&self, commit: &ContentHash) -> IndexResult<Option<ExecutionRecord>>;

    /// All executions whose execution hash or commit hash starts with
    /// `prefix`, most recent first.
    fn find_by_prefix(&self, prefix: &str) -> IndexResult<Vec<ExecutionRecord>>;

    /// Audit entries for an execution, in application order.
    fn audit_trail(&self, execution: &ContentHash) -> IndexResult<Vec<AuditRecord>>;

    fn snapshot(&self, execution: &ContentHash, kind: SnapshotKind) -> IndexResult<Option<SnapshotRecord>>;

    /// Number of execution rows.
    fn execution_count(&self) -> IndexResult<u64>;
}

/// Normalize a user-supplied hash prefix: non-empty hex, lowercased.
pub fn validate_prefix(prefix: &str) -> IndexResult<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty()
        || trimmed.len() > ContentHash::HEX_LEN
        || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(IndexError::InvalidPrefix(prefix.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}
