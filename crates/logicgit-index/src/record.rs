use chrono::{DateTime, Utc};
use logicgit_types::{ContentHash, Record};
use serde::{Deserialize, Serialize};

/// Summary row for one committed execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Insertion order; assigned by the index, higher is more recent.
    pub seq: u64,
    pub execution_hash: ContentHash,
    pub commit_hash: ContentHash,
    pub parent_hash: Option<ContentHash>,
    /// Where the rule set came from (usually the rules file name).
    pub rules_source: String,
    pub rules_hash: ContentHash,
    pub input_hash: ContentHash,
    pub output_hash: ContentHash,
    /// Fired rules in application order.
    pub applied_rules: Vec<String>,
    pub duration_us: u64,
    pub branch: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// One fired rule within an execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub execution_hash: ContentHash,
    /// Zero-based application order within the execution.
    pub position: u32,
    pub rule_name: String,
    pub condition_text: String,
    pub changes: Record,
    pub state_before: Record,
    pub state_after: Record,
    pub timestamp: DateTime<Utc>,
}

/// Which state a snapshot captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Final,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Final => "final",
        }
    }
}

/// A persisted record state, keyed by execution hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub execution_hash: ContentHash,
    pub kind: SnapshotKind,
    pub state: Record,
    pub state_hash: ContentHash,
    pub timestamp: DateTime<Utc>,
}

/// Everything the index stores for one commit, written in one transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionBundle {
    pub execution: ExecutionRecord,
    pub audit: Vec<AuditRecord>,
    pub snapshot: SnapshotRecord,
}
