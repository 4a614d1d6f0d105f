use crate::agent::executor::execute;
use crate::agent::prompt::{build_table_prompt, Prompt};
use crate::error::{QueryMeError, Result};
use crate::export::write_csv;
use crate::llm::model::Completion;
use crate::table::{ResultSet, Table};
use crate::upload::{decode_batch, Upload};
use std::io::Write;

pub const PAGE_SIZE: usize = 10;

/// transient state of one user session: loaded tables, view cursor, last result
#[derive(Debug, Default)]
pub struct Session {
    tables: Vec<Table>,
    cursor: usize,
    last_result: Option<ResultSet>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// replace everything with the tables of a new upload batch
    #[tracing::instrument(skip(self, uploads), fields(batch_size = uploads.len()))]
    pub fn load_batch(&mut self, uploads: &[Upload]) -> Result<&[Table]> {
        self.clear();
        self.tables = decode_batch(uploads).map_err(QueryMeError::into_invalid_upload)?;
        Ok(&self.tables)
    }

    /// drop every table, the cursor and the last result
    pub fn clear(&mut self) {
        self.tables.clear();
        self.cursor = 0;
        self.last_result = None;
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Table> {
        self.tables.get(self.cursor)
    }

    pub fn next(&mut self) -> Option<&Table> {
        if !self.tables.is_empty() {
            self.cursor = (self.cursor + 1) % self.tables.len();
        }
        self.current()
    }

    pub fn previous(&mut self) -> Option<&Table> {
        if !self.tables.is_empty() {
            let n = self.tables.len();
            self.cursor = (self.cursor + n - 1) % n;
        }
        self.current()
    }

    pub fn prompt(&self, request: &str) -> Prompt {
        build_table_prompt(request, &self.tables)
    }

    /// answer a natural language request; any failure clears the stored result
    #[tracing::instrument(skip(self, completion), fields(table_count = self.tables.len()))]
    pub fn run_query(&mut self, request: &str, completion: &dyn Completion) -> Result<&ResultSet> {
        self.last_result = None;

        let request = request.trim();
        if request.is_empty() {
            return Err(QueryMeError::QueryFailure("query request is empty".to_string()));
        }

        let prompt = self.prompt(request);
        let result = execute(&self.tables, &prompt, completion)?;

        Ok(self.last_result.insert(result))
    }

    pub fn last_result(&self) -> Option<&ResultSet> {
        self.last_result.as_ref()
    }

    /// write the last successful result as csv, zero-row results included
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let result = self.last_result.as_ref().ok_or_else(|| {
            QueryMeError::ExportFailure("no query result to export".to_string())
        })?;

        write_csv(result, writer).map_err(|e| QueryMeError::ExportFailure(e.to_string()))
    }
}
