use chrono::{TimeZone, Utc};
use logicgit_types::ContentHash;
use serde_json::json;

use crate::record::{AuditRecord, ExecutionBundle, ExecutionRecord, SnapshotKind, SnapshotRecord};

pub(crate) fn hash(byte: u8) -> ContentHash {
    ContentHash::from([byte; 32])
}

/// A loan-approval execution with two fired rules.
pub(crate) fn bundle(commit: u8, execution: u8) -> ExecutionBundle {
    let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let input = json!({"creditScore": 750});
    let rated = json!({"creditScore": 750, "rate": 3.5});
    let approved = json!({"creditScore": 750, "rate": 3.5, "approved": true});

    ExecutionBundle {
        execution: ExecutionRecord {
            seq: 0,
            execution_hash: hash(execution),
            commit_hash: hash(commit),
            parent_hash: None,
            rules_source: "loan.yaml".into(),
            rules_hash: hash(0xa1),
            input_hash: hash(0xa2),
            output_hash: hash(0xa3),
            applied_rules: vec!["setRate".into(), "approve".into()],
            duration_us: 42,
            branch: "main".into(),
            message: "approve loan".into(),
            author: "logic-git".into(),
            timestamp,
        },
        audit: vec![
            AuditRecord {
                execution_hash: hash(execution),
                position: 0,
                rule_name: "setRate".into(),
                condition_text: "creditScore >= 700".into(),
                changes: json!({"rate": 3.5}),
                state_before: input,
                state_after: rated.clone(),
                timestamp,
            },
            AuditRecord {
                execution_hash: hash(execution),
                position: 1,
                rule_name: "approve".into(),
                condition_text: "rate < 5".into(),
                changes: json!({"approved": true}),
                state_before: rated,
                state_after: approved.clone(),
                timestamp,
            },
        ],
        snapshot: SnapshotRecord {
            execution_hash: hash(execution),
            kind: SnapshotKind::Final,
            state: approved,
            state_hash: hash(0xa3),
            timestamp,
        },
    }
}
