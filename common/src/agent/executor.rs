use crate::agent::parser::{assemble_statement, clean_fragment, derive_columns, validate_statement};
use crate::agent::prompt::Prompt;
use crate::error::Result;
use crate::llm::model::Completion;
use crate::store::EphemeralStore;
use crate::table::{ResultSet, Table};

fn run(tables: &[Table], prompt: &Prompt, completion: &dyn Completion) -> Result<ResultSet> {
    let generated = completion.complete(&prompt.text)?;

    let fragment = clean_fragment(&generated);
    let derived = derive_columns(&fragment);

    let statement = assemble_statement(&prompt.query_prefix, &fragment);
    validate_statement(&statement)?;
    tracing::info!(%statement, "assembled statement");

    let mut store = EphemeralStore::open()?;
    for table in tables {
        store.load_table(table)?;
    }

    let result = store.query(&statement)?;
    drop(store);

    if result.columns != derived {
        tracing::warn!(
            derived = ?derived,
            returned = ?result.columns,
            "column names in the statement text differ from the executed columns"
        );
    }

    Ok(result)
}

/// send the prompt, splice the continuation onto the prefix and run it against the tables
#[tracing::instrument(skip(tables, prompt, completion), fields(table_count = tables.len()))]
pub fn execute(tables: &[Table], prompt: &Prompt, completion: &dyn Completion) -> Result<ResultSet> {
    match run(tables, prompt, completion) {
        Ok(result) => {
            tracing::info!(rows = result.rows.len(), "query succeeded");
            Ok(result)
        }
        Err(e) => {
            tracing::warn!("query failed: {}", e);
            Err(e.into_query_failure())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::build_table_prompt;
    use crate::error::{ErrorKind, QueryMeError};
    use crate::llm::model::FixedCompletion;
    use crate::schema::Value;

    struct FailingCompletion;

    impl Completion for FailingCompletion {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(QueryMeError::Completion("connection refused".to_string()))
        }
    }

    fn orders() -> Table {
        Table {
            name: "orders".to_string(),
            source: "orders.csv".to_string(),
            last_modified: None,
            columns: vec!["id".to_string(), "amount".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::Real(9.5)],
                vec![Value::Integer(2), Value::Real(20.0)],
            ],
        }
    }

    #[test]
    fn test_execute_end_to_end() {
        let tables = vec![orders()];
        let prompt = build_table_prompt("total amount by id", &tables);
        assert!(prompt.text.contains("\n# orders(id, amount)\n"));

        let completion = FixedCompletion::new(" id, amount FROM orders");
        let result = execute(&tables, &prompt, &completion).unwrap();

        assert_eq!(result.columns, vec!["id", "amount"]);
        assert_eq!(result.rows, tables[0].rows);
    }

    #[test]
    fn test_execute_strips_trailing_content() {
        let tables = vec![orders()];
        let prompt = build_table_prompt("ids", &tables);
        let completion = FixedCompletion::new(" o.id\nFROM orders o\nWHERE o.amount > 10</code> done");

        let result = execute(&tables, &prompt, &completion).unwrap();
        assert_eq!(result.columns, vec!["id"]);
        assert_eq!(result.rows, vec![vec![Value::Integer(2)]]);
    }

    #[test]
    fn test_execute_missing_table_fails() {
        let prompt = build_table_prompt("everything", &[]);
        let completion = FixedCompletion::new(" * FROM nowhere");

        let err = execute(&[], &prompt, &completion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailure);
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_execute_transport_failure() {
        let tables = vec![orders()];
        let prompt = build_table_prompt("anything", &tables);

        let err = execute(&tables, &prompt, &FailingCompletion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailure);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_execute_rejects_non_select() {
        let tables = vec![orders()];
        let prompt = Prompt {
            text: "irrelevant".to_string(),
            query_prefix: String::new(),
        };
        let completion = FixedCompletion::new("DELETE FROM orders");

        let err = execute(&tables, &prompt, &completion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailure);
    }
}
