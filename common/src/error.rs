use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryMeError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("query failed: {0}")]
    QueryFailure(String),

    #[error("export failed: {0}")]
    ExportFailure(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("completion service error: {0}")]
    Completion(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

/// user-facing category of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUpload,
    QueryFailure,
    ExportFailure,
    Other,
}

impl QueryMeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryMeError::InvalidUpload(_) => ErrorKind::InvalidUpload,
            QueryMeError::QueryFailure(_) => ErrorKind::QueryFailure,
            QueryMeError::ExportFailure(_) => ErrorKind::ExportFailure,
            _ => ErrorKind::Other,
        }
    }

    /// collapse any error raised while answering a query into a query failure
    pub fn into_query_failure(self) -> Self {
        match self {
            QueryMeError::QueryFailure(_) => self,
            other => QueryMeError::QueryFailure(other.to_string()),
        }
    }

    /// collapse any error raised while decoding an upload batch into an invalid upload
    pub fn into_invalid_upload(self) -> Self {
        match self {
            QueryMeError::InvalidUpload(_) => self,
            other => QueryMeError::InvalidUpload(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryMeError>;
