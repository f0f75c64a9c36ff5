//! End-to-end scenarios against an on-disk repository.

use std::fs;
use std::path::Path;

use logicgit_sdk::{ExportDocument, RepoError, Repository};
use serde_json::json;

const LOAN_RULES: &str = r#"
metadata:
  version: "2.1.0"
  description: Loan approval
rules:
  - name: setRate
    priority: 1
    when: "credit_score >= 700"
    then:
      interest_rate: 3.5
  - name: flagReview
    priority: 2
    when: "credit_score < 650"
    then:
      review.required: true
  - name: approve
    priority: 3
    when: "credit_score >= 650 && income > 40000"
    then:
      approved: true
"#;

const APPLICANTS: &str = "name,credit_score,income\n\"Ada\",720,55000\nBob,610,38000\n";

fn setup() -> (tempfile::TempDir, logicgit_sdk::DiskRepository) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    fs::write(dir.path().join("rules/loan.yaml"), LOAN_RULES).unwrap();
    fs::write(dir.path().join("data/applicants.csv"), APPLICANTS).unwrap();
    (dir, repo)
}

#[test]
fn execute_files_commits_one_execution_per_record() {
    let (_dir, mut repo) = setup();
    let outcomes = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)
        .unwrap();
    assert_eq!(outcomes.len(), 2);

    let ada = &outcomes[0].execution;
    assert_eq!(ada.applied_rules, ["setRate", "approve"]);
    assert_eq!(ada.final_state["interest_rate"], json!(3.5));
    assert_eq!(ada.rules_source, "loan.yaml");
    assert_eq!(ada.metadata.version, "2.1.0");

    let bob = &outcomes[1].execution;
    assert_eq!(bob.applied_rules, ["flagReview"]);
    assert_eq!(bob.final_state["review"], json!({"required": true}));

    let log = repo.log(None, None).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].commit.message, "Execute loan.yaml on record 2");
    assert_eq!(log[1].commit.message, "Execute loan.yaml on record 1");
    assert_eq!(log[0].commit.parent, Some(outcomes[0].commit_hash));
}

#[test]
fn history_survives_reopening() {
    let (dir, mut repo) = setup();
    let outcomes = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), Some("batch"))
        .unwrap();
    drop(repo);

    let repo = Repository::open(dir.path()).unwrap();
    assert_eq!(repo.head().unwrap(), Some(outcomes[1].commit_hash));
    let log = repo.log(None, None).unwrap();
    assert!(log.iter().all(|entry| entry.commit.message == "batch"));

    let detail = repo.show(&outcomes[0].commit_hash.short_hex()).unwrap();
    assert_eq!(detail.audit_trail.len(), 2);
    assert_eq!(detail.final_state.as_ref(), Some(&outcomes[0].execution.final_state));
}

#[test]
fn identical_inputs_produce_identical_execution_hashes() {
    let (dir, mut repo) = setup();
    fs::write(dir.path().join("data/ada.json"), r#"{"name": "Ada", "credit_score": 720, "income": 55000}"#).unwrap();

    let csv = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)
        .unwrap();
    let json = repo
        .execute_files(Path::new("loan.yaml"), Path::new("ada.json"), None)
        .unwrap();

    assert_eq!(csv[0].execution.execution_hash, json[0].execution.execution_hash);
    assert_eq!(csv[0].execution.output_hash, json[0].execution.output_hash);
    assert_ne!(csv[0].commit_hash, json[0].commit_hash);
}

#[test]
fn diff_between_applicants() {
    let (_dir, mut repo) = setup();
    let outcomes = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)
        .unwrap();
    let a = outcomes[0].commit_hash.short_hex();
    let b = outcomes[1].commit_hash.short_hex();

    let report = repo.diff(&a, &b).unwrap();
    assert!(!report.rules_changed);
    assert!(report.output_changed);
    assert_eq!(report.added, ["flagReview"]);
    assert_eq!(report.removed, ["setRate", "approve"]);
    let state = report.state.unwrap();
    assert!(state.changes.iter().any(|c| c.path() == "review.required"));

    assert!(repo.diff(&a, &a).unwrap().is_identical());
}

#[test]
fn export_writes_self_contained_document() {
    let (dir, mut repo) = setup();
    let outcomes = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)
        .unwrap();
    let execution = &outcomes[0].execution;

    let path = repo.export(&execution.execution_hash.short_hex(), None).unwrap();
    assert_eq!(
        path,
        dir.path()
            .join("exports")
            .join(format!("execution_{}.json", execution.execution_hash.short_hex()))
    );

    let document: ExportDocument = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document.export_version, "1.0.0");
    assert_eq!(document.execution.commit_hash, outcomes[0].commit_hash);
    assert_eq!(document.audit_trail.len(), 2);
    assert_eq!(document.final_state.as_ref(), Some(&execution.final_state));

    let custom = dir.path().join("out/nested/ada.json");
    assert_eq!(repo.export(&outcomes[0].commit_hash.to_hex(), Some(custom.as_path())).unwrap(), custom);
    assert!(custom.is_file());
}

#[test]
fn branches_keep_separate_histories_on_disk() {
    let (dir, mut repo) = setup();
    repo.execute_files(Path::new("loan.yaml"), Path::new("applicants.csv"), None)
        .unwrap();
    repo.create_branch("stricter").unwrap();
    repo.checkout("stricter").unwrap();
    fs::write(
        dir.path().join("rules/strict.json"),
        r#"{"rules": [{"name": "deny", "when": "income < 60000", "then": {"approved": false}}]}"#,
    )
    .unwrap();
    repo.execute_files(Path::new("strict.json"), Path::new("applicants.csv"), None)
        .unwrap();
    drop(repo);

    let repo = Repository::open(dir.path()).unwrap();
    assert_eq!(repo.current_branch(), Some("stricter"));
    let stricter = repo.log(None, None).unwrap();
    assert_eq!(stricter.len(), 2);
    assert!(stricter.iter().all(|entry| entry.commit.message.starts_with("Execute strict.json")));
    assert_eq!(repo.log(Some("main"), None).unwrap().len(), 2);
    let names: Vec<_> = repo.branches().unwrap().into_iter().map(|b| b.name).collect();
    assert_eq!(names, ["main", "stricter"]);
}

#[test]
fn unsupported_data_format_commits_nothing() {
    let (dir, mut repo) = setup();
    fs::write(dir.path().join("data/applicants.xml"), "<applicants/>").unwrap();
    let err = repo
        .execute_files(Path::new("loan.yaml"), Path::new("applicants.xml"), None)
        .unwrap_err();
    assert!(matches!(err, RepoError::UnsupportedFormat(_)));
    assert!(repo.log(None, None).unwrap().is_empty());
}

#[test]
fn missing_input_is_not_found() {
    let (_dir, mut repo) = setup();
    let err = repo
        .execute_files(Path::new("nope.yaml"), Path::new("applicants.csv"), None)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { kind: "rules file", .. }));
}
