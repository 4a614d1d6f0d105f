use super::inference::{infer_column_kind, ValueKind};
use super::value::Value;
use serde::Serialize;
use std::fmt;

/// display label attached to a column for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Numeric,
    Datetime,
    Any,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Datetime => "datetime",
            ColumnType::Any => "any",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CLASSIFICATION: &[(ValueKind, ColumnType)] = &[
    (ValueKind::Integer, ColumnType::Numeric),
    (ValueKind::Real, ColumnType::Numeric),
    (ValueKind::Text, ColumnType::Text),
    (ValueKind::Boolean, ColumnType::Text),
    (ValueKind::Timestamp, ColumnType::Datetime),
];

pub fn column_type_for(kind: ValueKind) -> ColumnType {
    CLASSIFICATION
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, t)| *t)
        .unwrap_or(ColumnType::Any)
}

pub fn classify<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
    column_type_for(infer_column_kind(values))
}
