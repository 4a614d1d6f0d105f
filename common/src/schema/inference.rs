use super::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// closed set of value kinds a column can be inferred as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Integer,
    Real,
    Boolean,
    Timestamp,
    Text,
    Mixed,
}

impl ValueKind {
    pub fn of(value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Text(s) if looks_like_timestamp(s) => ValueKind::Timestamp,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// sqlite column type used when a column of this kind is created
    pub fn affinity(&self) -> &'static str {
        match self {
            ValueKind::Integer | ValueKind::Boolean => "INTEGER",
            ValueKind::Real => "REAL",
            ValueKind::Timestamp | ValueKind::Text => "TEXT",
            // no declared type, sqlite stores each value as given
            ValueKind::Null | ValueKind::Mixed => "",
        }
    }
}

fn looks_like_timestamp(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

pub fn merge_kinds(lhs: ValueKind, rhs: ValueKind) -> ValueKind {
    use ValueKind::*;

    match (lhs, rhs) {
        (a, b) if a == b => a,
        (Null, other) | (other, Null) => other,
        (Integer, Real) | (Real, Integer) => Real,
        (Timestamp, Text) | (Text, Timestamp) => Text,
        _ => Mixed,
    }
}

pub fn infer_column_kind<'a>(values: impl IntoIterator<Item = &'a Value>) -> ValueKind {
    values
        .into_iter()
        .map(ValueKind::of)
        .fold(ValueKind::Null, merge_kinds)
}

/// widen integers to reals in a column inferred as real
pub fn coerce_column<'a>(kind: ValueKind, values: impl IntoIterator<Item = &'a mut Value>) {
    if kind != ValueKind::Real {
        return;
    }

    for value in values {
        if let Value::Integer(i) = *value {
            *value = Value::Real(i as f64);
        }
    }
}
