//! Structured query fragments.
//!
//! Identifiers (`&'static str`) are compile time constants; every user supplied
//! value travels as a [`Value`] and is bound as a statement parameter.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Cmp { col: &'static str, op: Op, value: Value },
    /// Compares two columns, e.g. `updated_at > created_at`.
    Columns { left: &'static str, op: Op, right: &'static str },
    Between { col: &'static str, low: Value, high: Value },
    In { col: &'static str, values: Vec<Value>, negated: bool },
    Null { col: &'static str, negated: bool },
    Like { col: &'static str, pattern: Value },
    /// `DATE(col) = DATE(value)`.
    SameDay { col: &'static str, value: Value },
    /// `col [NOT] IN (select WHERE filter)` with a constant select clause.
    InSelect { col: &'static str, select: &'static str, filter: Option<Box<Expr>>, negated: bool },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// Matches nothing.
    False,
}

impl Expr {
    pub fn cmp(col: &'static str, op: Op, value: impl Into<Value>) -> Self {
        Expr::Cmp { col, op, value: value.into() }
    }

    pub fn eq(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Eq, value)
    }

    pub fn ne(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Ne, value)
    }

    pub fn gt(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Gt, value)
    }

    pub fn ge(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Ge, value)
    }

    pub fn lt(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Lt, value)
    }

    pub fn le(col: &'static str, value: impl Into<Value>) -> Self {
        Self::cmp(col, Op::Le, value)
    }

    pub fn columns(left: &'static str, op: Op, right: &'static str) -> Self {
        Expr::Columns { left, op, right }
    }

    pub fn between(col: &'static str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Expr::Between { col, low: low.into(), high: high.into() }
    }

    pub fn is_in(col: &'static str, values: Vec<Value>) -> Self {
        Expr::In { col, values, negated: false }
    }

    pub fn is_null(col: &'static str) -> Self {
        Expr::Null { col, negated: false }
    }

    pub fn not_null(col: &'static str) -> Self {
        Expr::Null { col, negated: true }
    }

    pub fn like(col: &'static str, pattern: impl Into<String>) -> Self {
        Expr::Like { col, pattern: Value::Text(pattern.into()) }
    }

    pub fn same_day(col: &'static str, value: impl Into<String>) -> Self {
        Expr::SameDay { col, value: Value::Text(value.into()) }
    }

    pub fn in_select(col: &'static str, select: &'static str, filter: Expr) -> Self {
        Expr::InSelect { col, select, filter: Some(Box::new(filter)), negated: false }
    }

    pub fn not_in_select(col: &'static str, select: &'static str, filter: Option<Expr>) -> Self {
        Expr::InSelect { col, select, filter: filter.map(Box::new), negated: true }
    }

    /// OR of LIKE patterns, one per `|` alternative.
    pub fn any_like(col: &'static str, patterns: Vec<String>) -> Self {
        Expr::Or(patterns.into_iter().map(|p| Expr::like(col, p)).collect())
    }

    /// Values bound by this expression, in render order.
    pub fn params(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Expr::Cmp { value, .. } | Expr::SameDay { value, .. } => out.push(value),
            Expr::Like { pattern, .. } => out.push(pattern),
            Expr::Between { low, high, .. } => {
                out.push(low);
                out.push(high);
            }
            Expr::In { values, .. } => out.extend(values.iter()),
            Expr::InSelect { filter: Some(f), .. } => f.collect_params(out),
            Expr::And(v) | Expr::Or(v) => v.iter().for_each(|e| e.collect_params(out)),
            Expr::Columns { .. } | Expr::Null { .. } | Expr::InSelect { filter: None, .. } | Expr::False => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Extra join on top of the fixed base tables. `on` is constant text;
/// `filter` carries any bound values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: &'static str,
    pub on: &'static str,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum OrderTerm {
    Asc(&'static str),
    Desc(&'static str),
    Random,
    /// Rows where `col = value` first.
    MatchFirst { col: &'static str, value: Value },
    /// Manhattan distance to a point, nearest first.
    Distance { lat_col: &'static str, lng_col: &'static str, lat: f64, lng: f64 },
}

/// Which table drives the result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    /// One row per file, joined to its photo.
    Files,
    /// One row per photo, joined to its primary file.
    Photos,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub source: Source,
    pub joins: Vec<Join>,
    pub predicates: Vec<Expr>,
    pub group_by: Vec<&'static str>,
    pub order: Vec<OrderTerm>,
    pub limit: i64,
    pub offset: i64,
}
