use chrono::{DateTime, Utc};
use logicgit_index::{AuditRecord, ExecutionRecord};
use logicgit_types::Record;
use serde::{Deserialize, Serialize};

/// Version stamped into every export document.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Self-contained description of one stored execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub execution: ExecutionRecord,
    pub audit_trail: Vec<AuditRecord>,
    /// `None` if the final snapshot is missing from the index.
    pub final_state: Option<Record>,
    pub export_timestamp: DateTime<Utc>,
    pub export_version: String,
}

impl ExportDocument {
    pub fn new(execution: ExecutionRecord, audit_trail: Vec<AuditRecord>, final_state: Option<Record>) -> Self {
        Self {
            execution,
            audit_trail,
            final_state,
            export_timestamp: Utc::now(),
            export_version: EXPORT_VERSION.to_string(),
        }
    }

    /// Default file name: `execution_<first 8 hex of the execution hash>.json`.
    pub fn file_name(&self) -> String {
        format!("execution_{}.json", self.execution.execution_hash.short_hex())
    }
}
