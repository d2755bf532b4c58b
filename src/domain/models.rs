use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A single typed cell exchanged with a stored procedure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Lenient integer view: numeric columns, whole floats and numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            SqlValue::Bool(v) => Some(i64::from(*v)),
            SqlValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Lenient boolean view: bit-style integers and "true"/"false" text.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(v) => Some(*v != 0),
            SqlValue::BigInt(v) => Some(*v != 0),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

// NULL renders as an empty string, matching how the procedures' text
// columns are read back.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => f.write_str(v),
            SqlValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Ordered named parameters for a procedure call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureParams(Vec<(String, SqlValue)>);

impl ProcedureParams {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, name: &str, value: impl Into<SqlValue>) -> Self {
        self.0.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One result row; column order is the order the database returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureRow {
    columns: Vec<(String, SqlValue)>,
}

impl ProcedureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &str, value: impl Into<SqlValue>) {
        self.columns.push((column.to_string(), value.into()));
    }

    /// Looks a column up by name. An exact match wins; otherwise the name
    /// is matched ignoring ASCII case, since PostgreSQL folds unquoted
    /// identifiers to lowercase.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn first(&self) -> Option<&SqlValue> {
        self.columns.first().map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Text view of a column; missing columns and NULL read as "".
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(ToString::to_string).unwrap_or_default()
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    pub fn flag(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(SqlValue::as_bool)
    }
}

/// The three shapes a procedure call can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureResult {
    Scalar(Option<SqlValue>),
    RowCount(u64),
    Rows(Vec<ProcedureRow>),
}

impl ProcedureResult {
    pub fn into_scalar(self) -> Option<SqlValue> {
        match self {
            ProcedureResult::Scalar(value) => value,
            ProcedureResult::RowCount(count) => Some(SqlValue::BigInt(count as i64)),
            ProcedureResult::Rows(rows) => rows.first().and_then(|r| r.first().cloned()),
        }
    }

    pub fn into_row_count(self) -> u64 {
        match self {
            ProcedureResult::Scalar(value) => value
                .and_then(|v| v.as_i64())
                .map(|v| v.max(0) as u64)
                .unwrap_or(0),
            ProcedureResult::RowCount(count) => count,
            ProcedureResult::Rows(rows) => rows.len() as u64,
        }
    }

    pub fn into_rows(self) -> Vec<ProcedureRow> {
        match self {
            ProcedureResult::Scalar(Some(value)) => vec![ProcedureRow::new().with("value", value)],
            ProcedureResult::Scalar(None) => Vec::new(),
            ProcedureResult::RowCount(count) => {
                vec![ProcedureRow::new().with("RowCount", count as i64)]
            }
            ProcedureResult::Rows(rows) => rows,
        }
    }
}
