// SQL Parameter Value Model

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A parameter value crossing the core/adapter boundary.
///
/// Adapters bind these to the driver's placeholder mechanism. The literal
/// rendering below exists for log output only and is never executed.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Render as a readable SQL literal for log output.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(v) => v.to_string(),
            SqlValue::Real(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Blob(v) => {
                let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
                format!("x'{}'", hex)
            }
            SqlValue::Bool(true) => "1".to_string(),
            SqlValue::Bool(false) => "0".to_string(),
            SqlValue::Uuid(v) => format!("'{}'", v),
            SqlValue::Timestamp(v) => format!("'{}'", v.to_rfc3339()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

/// Substitute each `?` placeholder with the rendered literal of the matching
/// argument. This is the exact text handed to a context's SQL log sink.
/// Surplus placeholders are left untouched.
pub fn format_command(sql: &str, args: &[SqlValue]) -> String {
    let mut out = String::with_capacity(sql.len() + args.len() * 8);
    let mut next = args.iter();
    for ch in sql.chars() {
        if ch == '?' {
            match next.next() {
                Some(arg) => out.push_str(&arg.to_literal()),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
