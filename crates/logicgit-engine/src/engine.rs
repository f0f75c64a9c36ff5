use std::time::Instant;

use chrono::Utc;
use logicgit_crypto::ContentHasher;
use logicgit_types::{ContentHash, ObjectKind, Record};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ConditionError, EngineResult};
use crate::execution::{AuditEntry, Diagnostic, Execution, ExecutionMetadata};
use crate::parser::parse_condition;
use crate::path::set_path;
use crate::rule::RuleSet;

/// Evaluates a rule's `when` text against a record.
///
/// Implementations must not mutate the record. Errors are reported per
/// rule and never abort an execution.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, condition: &str, record: &Record) -> Result<bool, ConditionError>;
}

/// The built-in evaluator: parse to [`Expr`](crate::Expr), then interpret.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprEvaluator;

impl ConditionEvaluator for ExprEvaluator {
    fn evaluate(&self, condition: &str, record: &Record) -> Result<bool, ConditionError> {
        parse_condition(condition)?.evaluate(record)
    }
}

/// What the execution hash is computed over.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionIdentity<'a> {
    rules: ContentHash,
    input: ContentHash,
    output: ContentHash,
    applied_rules: Vec<&'a str>,
}

/// Applies rule sets to records.
#[derive(Clone, Debug, Default)]
pub struct RuleEngine<E = ExprEvaluator> {
    evaluator: E,
}

impl RuleEngine<ExprEvaluator> {
    pub fn new() -> Self {
        Self {
            evaluator: ExprEvaluator,
        }
    }
}

impl<E: ConditionEvaluator> RuleEngine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    /// Execute `rules` against a copy of `input`.
    ///
    /// Rules run in priority order; each condition sees the state left by
    /// the rules before it.
    pub fn execute(&self, rules: &RuleSet, input: &Record) -> EngineResult<Execution> {
        let started = Instant::now();
        let ordered = rules.ordered();

        let mut state = input.clone();
        let mut applied_rules = Vec::new();
        let mut audit_trail = Vec::new();
        let mut diagnostics = Vec::new();

        for rule in &ordered {
            match self.evaluator.evaluate(&rule.when, &state) {
                Ok(true) => {
                    let state_before = state.clone();
                    for (path, value) in &rule.then {
                        set_path(&mut state, path, value.clone());
                    }
                    debug!(rule = %rule.name, priority = rule.priority, "rule fired");
                    applied_rules.push(rule.name.clone());
                    audit_trail.push(AuditEntry {
                        rule_name: rule.name.clone(),
                        condition_text: rule.when.clone(),
                        changes: rule.then.clone(),
                        state_before,
                        state_after: state.clone(),
                        timestamp: Utc::now(),
                    });
                }
                Ok(false) => debug!(rule = %rule.name, "rule skipped"),
                Err(err) => {
                    warn!(rule = %rule.name, condition = %rule.when, error = %err, "condition evaluation failed, rule skipped");
                    diagnostics.push(Diagnostic {
                        rule_name: rule.name.clone(),
                        condition_text: rule.when.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let rules_hash = ContentHasher::hash(ObjectKind::Rules, rules)?;
        let input_hash = ContentHasher::hash(ObjectKind::State, input)?;
        let output_hash = ContentHasher::hash(ObjectKind::State, &state)?;
        let mut sorted: Vec<&str> = applied_rules.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let execution_hash = ContentHasher::hash(
            ObjectKind::Execution,
            &ExecutionIdentity {
                rules: rules_hash,
                input: input_hash,
                output: output_hash,
                applied_rules: sorted,
            },
        )?;

        let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        debug!(
            execution = %execution_hash.short_hex(),
            rules = ordered.len(),
            applied = applied_rules.len(),
            duration_us,
            "execution complete"
        );

        Ok(Execution {
            execution_hash,
            rules_hash,
            input_hash,
            output_hash,
            metadata: ExecutionMetadata {
                version: rules.metadata.version.clone(),
                description: rules.metadata.description.clone(),
                rule_count: ordered.len(),
                applied_count: applied_rules.len(),
            },
            applied_rules,
            audit_trail,
            final_state: state,
            duration_us,
            rules_source: "unknown".to_string(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use proptest::prelude::*;
    use serde_json::json;

    fn loan_rules() -> RuleSet {
        RuleSet::new(vec![
            Rule::new("approve", "rate < 5 && income > 30000")
                .with_priority(20)
                .set("decision.approved", true),
            Rule::new("setRate", "creditScore >= 700")
                .with_priority(10)
                .set("rate", 3.5),
            Rule::new("flagReview", "creditScore < 600").set("review", true),
        ])
    }

    #[test]
    fn applies_rules_in_priority_order() {
        let input = json!({"creditScore": 720, "income": 45000});
        let exec = RuleEngine::new().execute(&loan_rules(), &input).unwrap();

        assert_eq!(exec.applied_rules, vec!["setRate", "approve"]);
        assert_eq!(exec.final_state["decision"]["approved"], json!(true));
        assert_eq!(exec.audit_trail.len(), 2);
        assert_eq!(exec.audit_trail[0].state_before, input);
        assert_eq!(exec.audit_trail[1].state_before, exec.audit_trail[0].state_after);
        assert_eq!(exec.metadata.rule_count, 3);
        assert_eq!(exec.metadata.applied_count, 2);
    }

    #[test]
    fn input_is_not_mutated() {
        let input = json!({"creditScore": 720, "income": 45000});
        let before = input.clone();
        let exec = RuleEngine::new().execute(&loan_rules(), &input).unwrap();
        assert_eq!(input, before);
        assert_ne!(exec.input_hash, exec.output_hash);
    }

    #[test]
    fn no_rules_fire_output_equals_input() {
        let input = json!({"creditScore": 650, "income": 10000});
        let exec = RuleEngine::new().execute(&loan_rules(), &input).unwrap();
        assert!(exec.applied_rules.is_empty());
        assert_eq!(exec.input_hash, exec.output_hash);
    }

    #[test]
    fn declaration_order_decides_ties() {
        // `mark` sets the flag that `react` reads; both share a priority.
        let mark = Rule::new("mark", "true").with_priority(1).set("flag", true);
        let react = Rule::new("react", "flag == true").with_priority(1).set("reacted", true);
        let input = json!({"flag": false});

        let forward = RuleEngine::new()
            .execute(&RuleSet::new(vec![mark.clone(), react.clone()]), &input)
            .unwrap();
        let reversed = RuleEngine::new()
            .execute(&RuleSet::new(vec![react, mark]), &input)
            .unwrap();

        assert_eq!(forward.applied_rules, vec!["mark", "react"]);
        assert_eq!(reversed.applied_rules, vec!["mark"]);
        assert_ne!(forward.final_state, reversed.final_state);
    }

    #[test]
    fn malformed_condition_is_skipped_with_diagnostic() {
        let rules = RuleSet::new(vec![
            Rule::new("broken", "creditScore >=").with_priority(1).set("x", 1),
            Rule::new("missing", "nope.deeper > 1").with_priority(2).set("y", 1),
            Rule::new("ok", "creditScore > 100").with_priority(3).set("z", 1),
        ]);
        let exec = RuleEngine::new().execute(&rules, &json!({"creditScore": 700})).unwrap();

        assert_eq!(exec.applied_rules, vec!["ok"]);
        let skipped: Vec<_> = exec.diagnostics.iter().map(|d| d.rule_name.as_str()).collect();
        assert_eq!(skipped, vec!["broken", "missing"]);
        assert!(exec.final_state.get("x").is_none());
    }

    #[test]
    fn deeply_nested_condition_does_not_block_other_rules() {
        let deep = format!("{}true{}", "(".repeat(5_000), ")".repeat(5_000));
        let rules = RuleSet::new(vec![
            Rule::new("deep", deep).with_priority(1).set("deep", true),
            Rule::new("negated", format!("{}true", "!".repeat(200_000))).with_priority(2),
            Rule::new("ok", "true").with_priority(3).set("ok", true),
        ]);
        let exec = RuleEngine::new().execute(&rules, &json!({})).unwrap();

        assert_eq!(exec.applied_rules, vec!["ok"]);
        assert_eq!(exec.final_state["ok"], json!(true));
        let skipped: Vec<_> = exec.diagnostics.iter().map(|d| d.rule_name.as_str()).collect();
        assert_eq!(skipped, vec!["deep", "negated"]);
        assert!(exec.diagnostics[0].message.contains("nested too deeply"));
    }

    #[test]
    fn output_hash_independent_of_firing_order() {
        // Same applied set in a different firing order, same output.
        let a = Rule::new("a", "true").set("a", 1);
        let b = Rule::new("b", "true").set("b", 1);
        let input = json!({});
        let first = RuleEngine::new()
            .execute(&RuleSet::new(vec![a.clone(), b.clone()]), &input)
            .unwrap();
        let second = RuleEngine::new().execute(&RuleSet::new(vec![b, a]), &input).unwrap();

        assert_eq!(first.output_hash, second.output_hash);
        assert_ne!(first.rules_hash, second.rules_hash);
        assert_ne!(first.applied_rules, second.applied_rules);
    }

    #[test]
    fn input_hash_ignores_key_order() {
        let a: Record = serde_json::from_str(r#"{"b": 2, "a": {"y": 1, "x": 0}}"#).unwrap();
        let b: Record = serde_json::from_str(r#"{"a": {"x": 0, "y": 1}, "b": 2}"#).unwrap();
        let engine = RuleEngine::new();
        let rules = loan_rules();
        assert_eq!(
            engine.execute(&rules, &a).unwrap().input_hash,
            engine.execute(&rules, &b).unwrap().input_hash
        );
    }

    struct AlwaysFails;

    impl ConditionEvaluator for AlwaysFails {
        fn evaluate(&self, _: &str, _: &Record) -> Result<bool, ConditionError> {
            Err(ConditionError::TypeMismatch("test".into()))
        }
    }

    #[test]
    fn custom_evaluator_failures_are_non_fatal() {
        let exec = RuleEngine::with_evaluator(AlwaysFails)
            .execute(&loan_rules(), &json!({}))
            .unwrap();
        assert!(exec.applied_rules.is_empty());
        assert_eq!(exec.diagnostics.len(), 3);
    }

    proptest! {
        #[test]
        fn execution_is_deterministic(score in 300i64..900, income in 0i64..200_000, review in any::<bool>()) {
            let input = json!({"creditScore": score, "income": income, "review": review});
            let engine = RuleEngine::new();
            let first = engine.execute(&loan_rules(), &input).unwrap();
            let second = engine.execute(&loan_rules(), &input).unwrap();

            prop_assert_eq!(first.execution_hash, second.execution_hash);
            prop_assert_eq!(first.rules_hash, second.rules_hash);
            prop_assert_eq!(first.input_hash, second.input_hash);
            prop_assert_eq!(first.output_hash, second.output_hash);
            prop_assert_eq!(first.applied_rules, second.applied_rules);
            prop_assert_eq!(first.final_state, second.final_state);
        }
    }
}
