use std::collections::HashSet;

use logicgit_index::ExecutionRecord;
use logicgit_types::{ContentHash, Record};
use serde::Serialize;

use crate::state_diff::{diff_states, StateDiff};

/// Pairwise comparison of two executions, `from` (A) to `to` (B).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub from: ContentHash,
    pub to: ContentHash,
    pub rules_changed: bool,
    pub output_changed: bool,
    /// `to.duration - from.duration`, in microseconds.
    pub duration_delta_us: i64,
    /// Rules fired in B but not in A, in B's application order.
    pub added: Vec<String>,
    /// Rules fired in A but not in B, in A's application order.
    pub removed: Vec<String>,
    /// Path-level final-state changes, when both snapshots are available.
    pub state: Option<StateDiff>,
}

impl DiffReport {
    /// Whether the two executions are indistinguishable by content.
    pub fn is_identical(&self) -> bool {
        !self.rules_changed && !self.output_changed && self.added.is_empty() && self.removed.is_empty()
    }

    /// Attach a final-state diff computed from the two snapshots.
    pub fn with_states(mut self, from: &Record, to: &Record) -> Self {
        self.state = Some(diff_states(from, to));
        self
    }
}

fn only_in(left: &[String], right: &[String]) -> Vec<String> {
    let right: HashSet<&str> = right.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    left.iter()
        .filter(|name| !right.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Compare execution A against execution B.
pub fn diff_executions(a: &ExecutionRecord, b: &ExecutionRecord) -> DiffReport {
    let duration_delta_us = i64::try_from(b.duration_us)
        .unwrap_or(i64::MAX)
        .saturating_sub(i64::try_from(a.duration_us).unwrap_or(i64::MAX));

    DiffReport {
        from: a.execution_hash,
        to: b.execution_hash,
        rules_changed: a.rules_hash != b.rules_hash,
        output_changed: a.output_hash != b.output_hash,
        duration_delta_us,
        added: only_in(&b.applied_rules, &a.applied_rules),
        removed: only_in(&a.applied_rules, &b.applied_rules),
        state: None,
    }
}
