use crate::error::Result;
use crate::schema::Value;
use crate::table::{unique_column_names, ResultSet, Table};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

/// a throwaway in-memory sqlite database, dropped after one query
pub struct EphemeralStore {
    conn: Connection,
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Boolean(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl EphemeralStore {
    pub fn open() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// create a table named after the upload and insert every row
    #[tracing::instrument(skip(self, table), fields(table = %table.name, rows = table.rows.len()))]
    pub fn load_table(&mut self, table: &Table) -> Result<()> {
        let column_defs: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let affinity = table.column_kind(i).affinity();
                if affinity.is_empty() {
                    quote_identifier(column)
                } else {
                    format!("{} {}", quote_identifier(column), affinity)
                }
            })
            .collect();

        let table_ident = quote_identifier(&table.name);
        let ddl = format!("CREATE TABLE {} ({})", table_ident, column_defs.join(", "));
        tracing::debug!(%ddl, "creating table");

        let tx = self.conn.transaction()?;
        tx.execute(&ddl, [])?;
        {
            let placeholders = vec!["?"; table.columns.len()].join(", ");
            let insert = format!("INSERT INTO {} VALUES ({})", table_ident, placeholders);
            let mut stmt = tx.prepare(&insert)?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    /// run a statement and collect every row, naming columns from the statement metadata;
    /// repeated names, as in `SELECT a.id, b.id`, get a `.1` suffix
    #[tracing::instrument(skip(self))]
    pub fn query(&self, sql: &str) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns = unique_column_names(stmt.column_names());
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i)?));
            }
            rows.push(values);
        }

        tracing::debug!(rows = rows.len(), columns = width, "query returned");
        Ok(ResultSet { columns, rows })
    }
}
