use logicgit_index::{AuditRecord, ExecutionRecord};
use logicgit_types::{Commit, ContentHash, Record};
use serde::Serialize;

/// One entry of a branch's history, newest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEntry {
    pub commit_hash: ContentHash,
    pub commit: Commit,
    /// Index row for the commit; `None` if the index has no row for it.
    pub execution: Option<ExecutionRecord>,
}

/// One stored execution with everything the index holds for it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionDetail {
    pub execution: ExecutionRecord,
    pub audit_trail: Vec<AuditRecord>,
    pub final_state: Option<Record>,
}

/// Result of committing one execution.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitOutcome {
    pub commit_hash: ContentHash,
    pub execution: logicgit_engine::Execution,
}
