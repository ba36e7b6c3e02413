use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::{CompareOp, Expr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("expected a boolean, found {0}")]
    NotBoolean(&'static str),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(super) fn evaluate_bool(expr: &Expr, record: &Map<String, Value>) -> Result<bool, EvalError> {
    match evaluate(expr, record)?.as_ref() {
        Value::Bool(b) => Ok(*b),
        other => Err(EvalError::NotBoolean(type_name(other))),
    }
}

fn evaluate<'a>(expr: &'a Expr, record: &'a Map<String, Value>) -> Result<Cow<'a, Value>, EvalError> {
    let value = match expr {
        Expr::Literal(value) => Cow::Borrowed(value),
        Expr::Field(path) => lookup(record, path).map_or(Cow::Owned(Value::Null), Cow::Borrowed),
        Expr::List(items) => Cow::Owned(Value::Array(
            items
                .iter()
                .map(|item| evaluate(item, record).map(Cow::into_owned))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Not(inner) => Cow::Owned(Value::Bool(!evaluate_bool(inner, record)?)),
        Expr::And(lhs, rhs) => Cow::Owned(Value::Bool(
            evaluate_bool(lhs, record)? && evaluate_bool(rhs, record)?,
        )),
        Expr::Or(lhs, rhs) => Cow::Owned(Value::Bool(
            evaluate_bool(lhs, record)? || evaluate_bool(rhs, record)?,
        )),
        Expr::Compare { op, lhs, rhs } => {
            let lhs = evaluate(lhs, record)?;
            let rhs = evaluate(rhs, record)?;
            Cow::Owned(Value::Bool(compare(*op, &lhs, &rhs)?))
        }
        Expr::Matches { lhs, regex, negated } => {
            let lhs = evaluate(lhs, record)?;
            let Value::String(text) = lhs.as_ref() else {
                return Err(EvalError::TypeMismatch {
                    op: if *negated { "!~" } else { "=~" },
                    lhs: type_name(&lhs),
                    rhs: "string",
                });
            };
            Cow::Owned(Value::Bool(regex.is_match(text) != *negated))
        }
    };
    Ok(value)
}

fn lookup<'a>(record: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(first)?;
    for segment in rest {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Equality that treats `1` and `1.0` as the same number
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y))
        }
        _ => lhs == rhs,
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    let mismatch = || EvalError::TypeMismatch {
        op: op.symbol(),
        lhs: type_name(lhs),
        rhs: type_name(rhs),
    };

    match op {
        CompareOp::Eq => Ok(loose_eq(lhs, rhs)),
        CompareOp::Ne => Ok(!loose_eq(lhs, rhs)),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a
                    .as_f64()
                    .zip(b.as_f64())
                    .and_then(|(a, b)| a.partial_cmp(&b)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            }
            .ok_or_else(mismatch)?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
        CompareOp::Contains => match (lhs, rhs) {
            (Value::String(hay), Value::String(needle)) => Ok(hay.contains(needle.as_str())),
            (Value::Array(items), needle) => Ok(items.iter().any(|item| loose_eq(item, needle))),
            _ => Err(mismatch()),
        },
        CompareOp::StartsWith => match (lhs, rhs) {
            (Value::String(s), Value::String(prefix)) => Ok(s.starts_with(prefix.as_str())),
            _ => Err(mismatch()),
        },
        CompareOp::EndsWith => match (lhs, rhs) {
            (Value::String(s), Value::String(suffix)) => Ok(s.ends_with(suffix.as_str())),
            _ => Err(mismatch()),
        },
        CompareOp::In => match rhs {
            Value::Array(items) => Ok(items.iter().any(|item| loose_eq(lhs, item))),
            Value::Object(map) => match lhs {
                Value::String(key) => Ok(map.contains_key(key)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
    }
}
