use crate::schema::{classify, infer_column_kind, ColumnType, Value, ValueKind};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// an uploaded table, held in memory for the lifetime of a session
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub source: String,
    pub last_modified: Option<i64>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// rows returned by executing an assembled statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// column annotation handed to whatever renders a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// borrowed view that serializes rows as an array of ordered records
pub struct Records<'a> {
    columns: &'a [String],
    rows: &'a [Vec<Value>],
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&Record {
                columns: self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    columns: &'a [String],
    row: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.row) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// make column names non-empty and unique: blanks become `Unnamed: <i>`,
/// repeats get a `.1`, `.2`, ... suffix
pub fn unique_column_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.into();
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();

    // names as written take priority over generated suffixes
    let written: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut unique = Vec::with_capacity(names.len());

    for name in &names {
        let mut candidate = name.clone();
        let mut suffix = 0;
        while used.contains(&candidate) || (suffix > 0 && written.contains(candidate.as_str())) {
            suffix += 1;
            candidate = format!("{}.{}", name, suffix);
        }
        used.insert(candidate.clone());
        unique.push(candidate);
    }

    unique
}

fn column_values<'a>(rows: &'a [Vec<Value>], index: usize) -> impl Iterator<Item = &'a Value> {
    rows.iter().filter_map(move |row| row.get(index))
}

fn column_specs(columns: &[String], rows: &[Vec<Value>]) -> Vec<ColumnSpec> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| ColumnSpec {
            name: name.clone(),
            id: name.clone(),
            column_type: classify(column_values(rows, i)),
        })
        .collect()
}

impl Table {
    pub fn records(&self) -> Records<'_> {
        Records {
            columns: &self.columns,
            rows: &self.rows,
        }
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        column_specs(&self.columns, &self.rows)
    }

    pub fn column_kind(&self, index: usize) -> ValueKind {
        infer_column_kind(column_values(&self.rows, index))
    }

    /// rows on the given zero-based page
    pub fn page(&self, page: usize, page_size: usize) -> &[Vec<Value>] {
        let start = page.saturating_mul(page_size).min(self.rows.len());
        let end = start.saturating_add(page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.rows.len().div_ceil(page_size)
    }
}

impl ResultSet {
    pub fn records(&self) -> Records<'_> {
        Records {
            columns: &self.columns,
            rows: &self.rows,
        }
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        column_specs(&self.columns, &self.rows)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders() -> Table {
        Table {
            name: "orders".to_string(),
            source: "orders.csv".to_string(),
            last_modified: None,
            columns: vec!["id".to_string(), "amount".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::Real(9.5)],
                vec![Value::Integer(2), Value::Real(20.0)],
                vec![Value::Integer(3), Value::Null],
            ],
        }
    }

    #[test]
    fn test_records_keep_column_order() {
        let table = orders();
        let out = serde_json::to_string(&table.records()).unwrap();
        assert!(out.starts_with(r#"[{"id":1,"amount":9.5}"#));

        let value = serde_json::to_value(table.records()).unwrap();
        assert_eq!(value[2], json!({"id": 3, "amount": null}));
    }

    #[test]
    fn test_column_specs() {
        let specs = orders().column_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].column_type, ColumnType::Numeric);
        assert_eq!(
            serde_json::to_value(&specs[1]).unwrap(),
            json!({"name": "amount", "id": "amount", "type": "numeric"})
        );
    }

    #[test]
    fn test_unique_column_names() {
        assert_eq!(unique_column_names(["a", "a", "b", "a"]), vec!["a", "a.1", "b", "a.2"]);
        assert_eq!(unique_column_names(["", "id", ""]), vec!["Unnamed: 0", "id", "Unnamed: 2"]);
        assert_eq!(unique_column_names(["id", "id"]), vec!["id", "id.1"]);
    }

    #[test]
    fn test_unique_column_names_skips_written_names() {
        assert_eq!(unique_column_names(["a", "a", "a.1"]), vec!["a", "a.2", "a.1"]);
    }

    #[test]
    fn test_paging() {
        let table = orders();
        assert_eq!(table.page(0, 2).len(), 2);
        assert_eq!(table.page(1, 2).len(), 1);
        assert!(table.page(5, 2).is_empty());
        assert_eq!(table.page_count(2), 2);
        assert_eq!(table.page_count(10), 1);
    }
}
