//! State-level diff: compare two records leaf by leaf.
//!
//! Records are flattened to dotted paths first (`decision.approved`), so a
//! change deep inside a nested mapping is reported at the path where it
//! happened rather than as a change to the whole top-level value. Sequences
//! and empty mappings are compared as leaves.

use std::collections::BTreeMap;

use logicgit_types::Record;
use serde::Serialize;
use serde_json::Value;

/// The result of comparing two states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateDiff {
    /// Changes in path order.
    pub changes: Vec<StateChange>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, StateChange::Added { .. }))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, StateChange::Removed { .. }))
            .count()
    }

    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, StateChange::Modified { .. }))
            .count()
    }
}

/// A single change at one dotted path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum StateChange {
    Added { path: String, value: Value },
    Removed { path: String, value: Value },
    Modified { path: String, old: Value, new: Value },
}

impl StateChange {
    pub fn path(&self) -> &str {
        match self {
            StateChange::Added { path, .. }
            | StateChange::Removed { path, .. }
            | StateChange::Modified { path, .. } => path,
        }
    }
}

/// Flatten a record into `dotted.path -> leaf value`.
///
/// A non-mapping root flattens to a single entry under the empty path.
pub fn flatten(record: &Record) -> BTreeMap<String, Value> {
    let mut leaves = BTreeMap::new();
    flatten_into(record, String::new(), &mut leaves);
    leaves
}

fn flatten_into(value: &Value, prefix: String, leaves: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, leaves);
            }
        }
        leaf => {
            leaves.insert(prefix, leaf.clone());
        }
    }
}

/// Compute the path-level diff between two states.
pub fn diff_states(old: &Record, new: &Record) -> StateDiff {
    let old = flatten(old);
    let new = flatten(new);
    let mut changes = Vec::new();

    for (path, old_val) in &old {
        match new.get(path) {
            Some(new_val) if new_val != old_val => changes.push(StateChange::Modified {
                path: path.clone(),
                old: old_val.clone(),
                new: new_val.clone(),
            }),
            Some(_) => {}
            None => changes.push(StateChange::Removed {
                path: path.clone(),
                value: old_val.clone(),
            }),
        }
    }
    for (path, new_val) in &new {
        if !old.contains_key(path) {
            changes.push(StateChange::Added {
                path: path.clone(),
                value: new_val.clone(),
            });
        }
    }

    changes.sort_by(|a, b| a.path().cmp(b.path()));
    StateDiff { changes }
}
