//! Boolean query language evaluated against a log record.
//!
//! ```text
//! level == "error"
//! status >= 500 and not (path startsWith "/health")
//! msg =~ "timeout|refused" || user.id in [1, 2, 3]
//! ```
//!
//! A query is compiled once into a [`Predicate`] and then evaluated against
//! every record. Missing fields evaluate to `null`.

mod eval;
mod parser;

use regex::Regex;
use serde_json::{Map, Value};

pub use eval::EvalError;

/// Compile error with the byte offset it was detected at
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{message} at position {position}")]
    Syntax { message: String, position: usize },
    #[error("invalid regex {pattern:?}: {source}")]
    Regex { pattern: String, source: regex::Error },
    #[error("expression does not evaluate to a boolean")]
    NotBoolean,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl CompareOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Contains => "contains",
            CompareOp::StartsWith => "startsWith",
            CompareOp::EndsWith => "endsWith",
            CompareOp::In => "in",
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Expr {
    Literal(Value),
    Field(Vec<String>),
    List(Vec<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Matches {
        lhs: Box<Expr>,
        regex: Regex,
        negated: bool,
    },
}

impl Expr {
    /// Whether this node could produce a boolean at run time
    fn may_be_boolean(&self) -> bool {
        match self {
            Expr::Literal(value) => value.is_boolean(),
            Expr::List(_) => false,
            _ => true,
        }
    }
}

/// A compiled query
#[derive(Clone, Debug)]
pub struct Predicate {
    source: String,
    root: Expr,
}

impl Predicate {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a record's fields
    pub fn evaluate(&self, record: &Map<String, Value>) -> Result<bool, EvalError> {
        eval::evaluate_bool(&self.root, record)
    }
}

/// Compile query text into a predicate
pub fn compile(input: &str) -> Result<Predicate, QueryError> {
    let root = parser::parse(input)?;
    ensure_boolean(&root)?;
    Ok(Predicate { source: input.to_string(), root })
}

/// Reject literals in positions that must be boolean
fn ensure_boolean(expr: &Expr) -> Result<(), QueryError> {
    match expr {
        Expr::Not(inner) => ensure_boolean(inner),
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            ensure_boolean(lhs)?;
            ensure_boolean(rhs)
        }
        other if other.may_be_boolean() => Ok(()),
        _ => Err(QueryError::NotBoolean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn eval(query: &str, value: Value) -> Result<bool, EvalError> {
        compile(query).unwrap().evaluate(&record(value))
    }

    #[test]
    fn test_equality() {
        assert!(eval(r#"level == "error""#, json!({"level": "error"})).unwrap());
        assert!(!eval(r#"level == "error""#, json!({"level": "info"})).unwrap());
        assert!(eval("status != 200", json!({"status": 500})).unwrap());
        assert!(eval("count == 1", json!({"count": 1.0})).unwrap());
    }

    #[test]
    fn test_ordering_and_logic() {
        let rec = json!({"status": 503, "path": "/api/users"});
        assert!(eval(r#"status >= 500 and path startsWith "/api""#, rec.clone()).unwrap());
        assert!(eval(r#"status < 400 || path endsWith "users""#, rec.clone()).unwrap());
        assert!(!eval(r#"not (status > 500)"#, rec.clone()).unwrap());
        assert!(eval(r#"!(status <= 500) && path contains "users""#, rec).unwrap());
    }

    #[test]
    fn test_nested_fields_and_missing() {
        let rec = json!({"user": {"id": "123"}});
        assert!(eval(r#"user.id == "123""#, rec.clone()).unwrap());
        assert!(eval("user.name == null", rec.clone()).unwrap());
        assert!(eval("missing.deep == null", rec).unwrap());
    }

    #[test]
    fn test_regex_and_membership() {
        let rec = json!({"message": "connection refused", "code": 2, "tags": ["db", "net"]});
        assert!(eval(r#"message =~ "timeout|refused""#, rec.clone()).unwrap());
        assert!(eval(r#"message !~ "^ok""#, rec.clone()).unwrap());
        assert!(eval(r#"message matches "conn""#, rec.clone()).unwrap());
        assert!(eval("code in [1, 2, 3]", rec.clone()).unwrap());
        assert!(eval(r#"tags contains "net""#, rec.clone()).unwrap());
        assert!(eval(r#""db" in tags"#, rec).unwrap());
    }

    #[test]
    fn test_bare_boolean_field() {
        assert!(eval("ok", json!({"ok": true})).unwrap());
        assert!(eval("ok", json!({"ok": "yes"})).is_err());
    }

    #[test]
    fn test_type_mismatch_is_eval_error() {
        let err = eval(r#"status > "high""#, json!({"status": 1})).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { op: ">", .. }));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(compile("level =="), Err(QueryError::Syntax { .. })));
        assert!(matches!(compile(r#"level == "open"#), Err(QueryError::Syntax { .. })));
        assert!(matches!(compile("(a == 1"), Err(QueryError::Syntax { .. })));
        assert!(matches!(compile("a == 1 b"), Err(QueryError::Syntax { .. })));
        assert!(matches!(compile(r#"msg =~ "(""#), Err(QueryError::Regex { .. })));
        assert!(matches!(compile(r#""just a string""#), Err(QueryError::NotBoolean)));
        assert!(matches!(compile("1 and ok"), Err(QueryError::NotBoolean)));
    }

    #[test]
    fn test_source_is_kept() {
        let predicate = compile("a == 1").unwrap();
        assert_eq!(predicate.source(), "a == 1");
    }
}
