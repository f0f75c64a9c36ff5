//! Rule-set and record loaders.
//!
//! Rules: YAML (`.yaml`, `.yml`) or JSON documents shaped as
//! `{ metadata: {version, description}, rules: [{name, priority?, when, then}] }`.
//!
//! Records: `.json` (one object, or an array of them) or `.csv` with a
//! header row. CSV cells are trimmed with quotes stripped; numeric cells
//! become numbers.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use logicgit_engine::RuleSet;
use logicgit_types::Record;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{RepoError, RepoResult};

/// Use `path` as given if it exists, else look for it under `base_dir`.
pub fn resolve_input(path: &Path, base_dir: &Path, kind: &'static str) -> RepoResult<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let joined = base_dir.join(path);
    if joined.is_file() {
        return Ok(joined);
    }
    Err(RepoError::not_found(kind, path.display().to_string()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

fn invalid(kind: &'static str, path: &Path, reason: impl ToString) -> RepoError {
    RepoError::InvalidInput {
        kind,
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Load and validate a rule set.
pub fn load_rules(path: &Path) -> RepoResult<RuleSet> {
    let rules: RuleSet = match extension(path).as_deref() {
        Some("yaml" | "yml") => {
            let text = fs::read_to_string(path)?;
            serde_yaml::from_str(&text).map_err(|e| invalid("rules file", path, e))?
        }
        Some("json") => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|e| invalid("rules file", path, e))?
        }
        _ => {
            return Err(RepoError::UnsupportedFormat(format!(
                "{}: rules must be .yaml, .yml, or .json",
                path.display()
            )))
        }
    };
    rules.validate()?;
    debug!(path = %path.display(), rules = rules.rules.len(), "loaded rule set");
    Ok(rules)
}

/// Load one or more records.
pub fn load_records(path: &Path) -> RepoResult<Vec<Record>> {
    let records = match extension(path).as_deref() {
        Some("json") => {
            let text = fs::read_to_string(path)?;
            match serde_json::from_str(&text).map_err(|e| invalid("data file", path, e))? {
                Value::Array(items) => items,
                single => vec![single],
            }
        }
        Some("csv") => parse_csv(&fs::read_to_string(path)?),
        _ => {
            return Err(RepoError::UnsupportedFormat(format!(
                "{}: data must be .json or .csv",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), records = records.len(), "loaded records");
    Ok(records)
}

/// Parse CSV text with a header row into one record per data row.
///
/// Rows shorter than the header get empty strings for missing cells.
///
/// This is a plain comma split, not RFC 4180: quotes are stripped from
/// cells but do not protect delimiters, so a quoted cell containing a
/// comma is split across two columns. Escaped quotes and quoted line
/// breaks are not supported either.
pub fn parse_csv(text: &str) -> Vec<Record> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.split(',').map(clean_cell).collect();

    lines
        .map(|line| {
            let cells: Vec<String> = line.split(',').map(clean_cell).collect();
            let row: Map<String, Value> = headers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let cell = cells.get(i).map_or("", String::as_str);
                    (name.clone(), csv_value(cell))
                })
                .collect();
            Value::Object(row)
        })
        .collect()
}

fn clean_cell(cell: &str) -> String {
    cell.trim().replace('"', "")
}

fn csv_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(cell.to_string()), Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const RULES_YAML: &str = r#"
metadata:
  version: "2.1.0"
  description: Loan approval
rules:
  - name: setRate
    priority: 10
    when: "creditScore >= 700"
    then:
      rate: 3.5
  - name: approve
    when: "rate < 5"
    then:
      decision.approved: true
"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_yaml_rules() {
        let dir = TempDir::new().unwrap();
        let rules = load_rules(&write(&dir, "loan.yaml", RULES_YAML)).unwrap();
        assert_eq!(rules.metadata.version, "2.1.0");
        assert_eq!(rules.rules.len(), 2);
        assert_eq!(rules.rules[1].priority, logicgit_engine::DEFAULT_PRIORITY);
        assert_eq!(rules.rules[1].then["decision.approved"], json!(true));
    }

    #[test]
    fn loads_json_rules() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "r.json",
            r#"{"rules":[{"name":"a","when":"x > 1","then":{"y":2}}]}"#,
        );
        let rules = load_rules(&path).unwrap();
        assert_eq!(rules.rules[0].name, "a");
        assert_eq!(rules.metadata.version, "1.0.0");
    }

    #[test]
    fn duplicate_rule_names_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "dup.yaml",
            "rules:\n  - {name: a, when: 'true', then: {}}\n  - {name: a, when: 'true', then: {}}\n",
        );
        assert!(matches!(load_rules(&path), Err(RepoError::Engine(_))));
    }

    #[test]
    fn malformed_rules_reported_as_invalid_input() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.yaml", "rules: [ {name: a} ]\n");
        assert!(matches!(load_rules(&path), Err(RepoError::InvalidInput { .. })));
    }

    #[test]
    fn unsupported_extensions() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.xml", "<x/>");
        assert!(matches!(load_records(&path), Err(RepoError::UnsupportedFormat(_))));
        assert!(matches!(load_rules(&path), Err(RepoError::UnsupportedFormat(_))));
    }

    #[test]
    fn json_single_and_array() {
        let dir = TempDir::new().unwrap();
        let single = write(&dir, "one.json", r#"{"id": 1}"#);
        let many = write(&dir, "many.json", r#"[{"id": 1}, {"id": 2}]"#);
        assert_eq!(load_records(&single).unwrap(), vec![json!({"id": 1})]);
        assert_eq!(load_records(&many).unwrap().len(), 2);
    }

    #[test]
    fn csv_conversion() {
        let records = parse_csv("name, score ,ratio,note\n\"alice\", 720 ,0.35,\nbob,abc\n\n");
        assert_eq!(
            records,
            vec![
                json!({"name": "alice", "score": 720, "ratio": 0.35, "note": ""}),
                json!({"name": "bob", "score": "abc", "ratio": "", "note": ""}),
            ]
        );
    }

    #[test]
    fn csv_quotes_do_not_protect_commas() {
        let records = parse_csv("name,city,score\n\"Lovelace, Ada\",London,720\n");
        assert_eq!(records, vec![json!({"name": "Lovelace", "city": "Ada", "score": "London"})]);
    }

    #[test]
    fn resolve_prefers_existing_path_then_base_dir() {
        let dir = TempDir::new().unwrap();
        let rules_dir = dir.path().join("rules");
        fs::create_dir_all(&rules_dir).unwrap();
        fs::write(rules_dir.join("loan.yaml"), RULES_YAML).unwrap();

        let found = resolve_input(Path::new("loan.yaml"), &rules_dir, "rules file").unwrap();
        assert_eq!(found, rules_dir.join("loan.yaml"));
        assert!(matches!(
            resolve_input(Path::new("ghost.yaml"), &rules_dir, "rules file"),
            Err(RepoError::NotFound { kind: "rules file", .. })
        ));
    }
}
