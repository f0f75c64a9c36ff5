//! Condition expressions.
//!
//! A condition is a tree over four node shapes: a dotted-path reference
//! into the record, a literal, a comparison, and the boolean combinators.
//! [`Expr::evaluate`] walks the tree against a record without mutating it.

use std::borrow::Cow;
use std::cmp::Ordering;

use logicgit_types::Record;
use serde_json::{Number, Value};

use crate::error::ConditionError;
use crate::path::get_path;

/// A parsed condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Dotted path into the record, e.g. `applicant.creditScore`.
    Path(String),
    Literal(Value),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

/// Comparison operators.
///
/// `==`/`!=` treat a number and a numeric string as equal when they denote
/// the same number; `===`/`!==` never coerce. Ordering operators accept
/// two numbers or two strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::StrictEq => "===",
            CompareOp::StrictNe => "!==",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl Expr {
    /// Evaluate to a boolean. Anything else is [`ConditionError::NotBoolean`].
    pub fn evaluate(&self, record: &Record) -> Result<bool, ConditionError> {
        let value = self.eval(record)?;
        value
            .as_bool()
            .ok_or_else(|| ConditionError::NotBoolean(type_name(&value).to_string()))
    }

    /// Evaluate to a value.
    pub fn eval<'a>(&'a self, record: &'a Record) -> Result<Cow<'a, Value>, ConditionError> {
        match self {
            Expr::Path(path) => get_path(record, path)
                .map(Cow::Borrowed)
                .ok_or_else(|| ConditionError::MissingPath(path.clone())),

            Expr::Literal(value) => Ok(Cow::Borrowed(value)),

            Expr::Compare { left, op, right } => {
                let left = left.eval(record)?;
                let right = right.eval(record)?;
                compare(&left, *op, &right).map(|b| Cow::Owned(Value::Bool(b)))
            }

            // Short-circuit: the right side is not evaluated (and cannot
            // fail) once the left side decides the result.
            Expr::And(left, right) => {
                let result = left.evaluate(record)? && right.evaluate(record)?;
                Ok(Cow::Owned(Value::Bool(result)))
            }
            Expr::Or(left, right) => {
                let result = left.evaluate(record)? || right.evaluate(record)?;
                Ok(Cow::Owned(Value::Bool(result)))
            }

            Expr::Not(inner) => Ok(Cow::Owned(Value::Bool(!inner.evaluate(record)?))),
        }
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, ConditionError> {
    let ordering = || {
        order(left, right).ok_or_else(|| {
            ConditionError::TypeMismatch(format!(
                "cannot compare {} {} {}",
                type_name(left),
                op.symbol(),
                type_name(right)
            ))
        })
    };
    Ok(match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::Ne => !loose_eq(left, right),
        CompareOp::StrictEq => strict_eq(left, right),
        CompareOp::StrictNe => !strict_eq(left, right),
        CompareOp::Lt => ordering()?.is_lt(),
        CompareOp::Le => ordering()?.is_le(),
        CompareOp::Gt => ordering()?.is_gt(),
        CompareOp::Ge => ordering()?.is_ge(),
    })
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => number_cmp(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match (s.trim().parse::<f64>(), n.as_f64()) {
                (Ok(parsed), Some(number)) => parsed == number,
                _ => false,
            }
        }
        _ => strict_eq(left, right),
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => number_cmp(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Integers compare exactly; anything involving a float goes through f64.
fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
