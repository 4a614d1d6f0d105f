pub mod classify;
pub mod inference;
pub mod value;

pub use classify::{classify, ColumnType};
pub use inference::{infer_column_kind, merge_kinds, ValueKind};
pub use value::Value;
