use chrono::{DateTime, Utc};
use logicgit_types::{ContentHash, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Before/after provenance for one fired rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub rule_name: String,
    pub condition_text: String,
    /// The rule's `then` mapping.
    pub changes: Map<String, Value>,
    pub state_before: Record,
    pub state_after: Record,
    pub timestamp: DateTime<Utc>,
}

/// A warning produced while executing, e.g. a condition that failed to
/// evaluate. The affected rule did not fire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_name: String,
    pub condition_text: String,
    pub message: String,
}

/// Descriptive fields carried alongside an execution. Not hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub version: String,
    pub description: String,
    pub rule_count: usize,
    pub applied_count: usize,
}

/// The result of applying one rule set to one record.
///
/// `execution_hash` depends only on the rules, input, output, and the
/// sorted applied-rule names; duration, timestamps, diagnostics, and
/// metadata are excluded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub execution_hash: ContentHash,
    pub rules_hash: ContentHash,
    pub input_hash: ContentHash,
    pub output_hash: ContentHash,
    /// Fired rules in application order.
    pub applied_rules: Vec<String>,
    pub audit_trail: Vec<AuditEntry>,
    pub final_state: Record,
    pub duration_us: u64,
    /// Where the rules came from, usually a file name.
    pub rules_source: String,
    pub metadata: ExecutionMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl Execution {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.rules_source = source.into();
        self
    }

    pub fn fired(&self, rule: &str) -> bool {
        self.applied_rules.iter().any(|name| name == rule)
    }
}
