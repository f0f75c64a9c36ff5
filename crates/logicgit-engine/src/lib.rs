//! Deterministic rule engine for logicgit.
//!
//! [`RuleEngine::execute`] applies a [`RuleSet`] to a [`Record`](logicgit_types::Record):
//! rules are stable-sorted by priority, each `when` condition is evaluated
//! against the working state as earlier rules left it, and every rule that
//! fires writes its `then` assignments and leaves an [`AuditEntry`].
//!
//! Conditions are parsed into a small [`Expr`] tree and interpreted over the
//! record. A condition that fails to parse or evaluate never aborts an
//! execution; the rule is skipped and a [`Diagnostic`] is attached.
//!
//! # Modules
//!
//! - [`rule`] — [`Rule`], [`RuleSet`], [`RuleMetadata`]
//! - [`expr`] — the condition AST and its interpreter
//! - [`parser`] — condition text to [`Expr`]
//! - [`path`] — dotted-path lookup and assignment
//! - [`engine`] — [`RuleEngine`] and the [`ConditionEvaluator`] seam
//! - [`execution`] — [`Execution`], [`AuditEntry`], [`Diagnostic`]

pub mod engine;
pub mod error;
pub mod execution;
pub mod expr;
pub mod parser;
pub mod path;
pub mod rule;

pub use engine::{ConditionEvaluator, ExprEvaluator, RuleEngine};
pub use error::{ConditionError, EngineError, EngineResult};
pub use execution::{AuditEntry, Diagnostic, Execution, ExecutionMetadata};
pub use expr::{CompareOp, Expr};
pub use parser::parse_condition;
pub use rule::{Rule, RuleMetadata, RuleSet, DEFAULT_PRIORITY};
