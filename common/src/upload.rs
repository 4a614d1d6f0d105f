use crate::error::{QueryMeError, Result};
use crate::schema::inference::coerce_column;
use crate::schema::{infer_column_kind, Value};
use crate::table::{unique_column_names, Table};
use base64::Engine;
use std::path::Path;

pub const ACCEPTED_CONTENT_TYPE: &str = "csv";

/// one file of an upload batch
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub last_modified: Option<i64>,
}

impl Upload {
    /// parse a browser style `data:<type>;base64,<payload>` url
    pub fn from_data_url(
        filename: impl Into<String>,
        data_url: &str,
        last_modified: Option<i64>,
    ) -> Result<Self> {
        let filename = filename.into();
        let (header, payload) = data_url.split_once(',').ok_or_else(|| {
            QueryMeError::InvalidUpload(format!("{}: content is not a data url", filename))
        })?;

        let content_type = header
            .trim_start_matches("data:")
            .trim_end_matches(";base64")
            .to_string();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| QueryMeError::InvalidUpload(format!("{}: {}", filename, e)))?;

        Ok(Self {
            filename,
            content_type,
            bytes,
            last_modified,
        })
    }

    /// read a local file, deriving its content type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let content_type = match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => "text/csv".to_string(),
            Some(ext) => format!("application/{}", ext.to_ascii_lowercase()),
            None => "application/octet-stream".to_string(),
        };

        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);

        Ok(Self {
            filename,
            content_type,
            bytes,
            last_modified,
        })
    }

    pub fn table_name(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
            .to_string()
    }

    pub fn is_accepted(&self) -> bool {
        self.content_type.contains(ACCEPTED_CONTENT_TYPE)
    }
}

/// decode every upload of a batch, rejecting the whole batch on the first bad file
#[tracing::instrument(skip(uploads), fields(batch_size = uploads.len()))]
pub fn decode_batch(uploads: &[Upload]) -> Result<Vec<Table>> {
    let mut tables = Vec::with_capacity(uploads.len());

    for upload in uploads {
        if !upload.is_accepted() {
            tracing::warn!(
                filename = %upload.filename,
                content_type = %upload.content_type,
                "rejecting upload batch"
            );
            return Err(QueryMeError::InvalidUpload(format!(
                "{} has content type '{}', only {} files are accepted",
                upload.filename, upload.content_type, ACCEPTED_CONTENT_TYPE
            )));
        }

        let table = read_csv_table(upload).map_err(|e| {
            QueryMeError::InvalidUpload(format!("{}: {}", upload.filename, e))
        })?;

        tracing::debug!(
            table = %table.name,
            columns = table.columns.len(),
            rows = table.rows.len(),
            "decoded upload"
        );
        tables.push(table);
    }

    tracing::info!("decoded {} tables", tables.len());
    Ok(tables)
}

fn read_csv_table(upload: &Upload) -> Result<Table> {
    let text = String::from_utf8(upload.bytes.clone())?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?;
    if headers.is_empty() {
        return Err(QueryMeError::InvalidUpload("missing header line".to_string()));
    }
    let columns = unique_column_names(headers.iter());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::parse_field).collect::<Vec<_>>());
    }

    for i in 0..columns.len() {
        let kind = infer_column_kind(rows.iter().filter_map(|row| row.get(i)));
        coerce_column(kind, rows.iter_mut().filter_map(|row| row.get_mut(i)));
    }

    Ok(Table {
        name: upload.table_name(),
        source: upload.filename.clone(),
        last_modified: upload.last_modified,
        columns,
        rows,
    })
}
