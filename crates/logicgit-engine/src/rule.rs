use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult};
use crate::path::is_valid_path;

/// Priority given to rules that do not declare one. Lower runs first.
pub const DEFAULT_PRIORITY: i64 = 999;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// One declarative rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique within its rule set.
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Condition text, see [`parse_condition`](crate::parse_condition).
    pub when: String,
    /// Dotted path to literal value, applied in path order.
    pub then: Map<String, Value>,
}

impl Rule {
    pub fn new(name: impl Into<String>, when: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: DEFAULT_PRIORITY,
            when: when.into(),
            then: Map::new(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Add one `then` assignment.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.then.insert(path.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

impl Default for RuleMetadata {
    fn default() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
        }
    }
}

/// An ordered rule collection. Declaration order breaks priority ties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub metadata: RuleMetadata,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            metadata: RuleMetadata::default(),
            rules,
        }
    }

    /// Check structural constraints: non-empty unique names, non-empty
    /// conditions, and well-formed assignment paths.
    ///
    /// Conditions are not parsed here; a condition that does not parse
    /// only disables its own rule at execution time.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            let invalid = |reason: &str| EngineError::InvalidRule {
                name: rule.name.clone(),
                reason: reason.to_string(),
            };
            if rule.name.trim().is_empty() {
                return Err(invalid("rule name must not be empty"));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(EngineError::DuplicateRule(rule.name.clone()));
            }
            if rule.when.trim().is_empty() {
                return Err(invalid("`when` must not be empty"));
            }
            if let Some(path) = rule.then.keys().find(|p| !is_valid_path(p)) {
                return Err(invalid(&format!("malformed `then` path {path:?}")));
            }
        }
        Ok(())
    }

    /// Rules in application order: priority ascending, stable.
    pub fn ordered(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|rule| rule.priority);
        rules
    }
}
