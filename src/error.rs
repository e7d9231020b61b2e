//! Error types for cnc-dl
//!
//! Every failure aborts the collection being downloaded. The variants carry
//! enough context (project, cursor, record id, field) to tell from the log
//! line alone which request or record broke the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cnc-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cnc-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.per_page")
        key: Option<String>,
    },

    /// Transport-level HTTP failure (connect, timeout, body decoding)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status code
    #[error("observations API returned HTTP {status} for {url}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Request URL including the query string
        url: String,
    },

    /// Response body or config file was not the JSON we expected
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key every observation must carry was absent
    #[error("{}: missing field `{field}`", describe_record(.record_id))]
    MissingField {
        /// Id of the offending observation, if it could be read
        record_id: Option<i64>,
        /// Dotted path of the missing key (e.g. "user.login")
        field: String,
    },

    /// A field was present but could not be interpreted
    #[error("{}: {reason}", describe_record(.record_id))]
    MalformedRecord {
        /// Id of the offending observation, if it could be read
        record_id: Option<i64>,
        /// What was wrong with it
        reason: String,
    },

    /// The last id of a page did not move past the cursor
    #[error("cursor stalled for project {project_id}: id_above={cursor}, last id on page={last_id}")]
    CursorStalled {
        /// Project being downloaded
        project_id: i64,
        /// Cursor value used for the request
        cursor: i64,
        /// Id of the last record returned
        last_id: i64,
    },

    /// CSV encoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Output file could not be persisted
    #[error("failed to write {path}: {reason}")]
    Output {
        /// Destination path
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::Serialization(_) => "serialization_error",
            Error::MissingField { .. } => "missing_field",
            Error::MalformedRecord { .. } => "malformed_record",
            Error::CursorStalled { .. } => "cursor_stalled",
            Error::Csv(_) => "csv_error",
            Error::Output { .. } => "output_error",
            Error::Io(_) => "io_error",
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Id of the observation the error refers to, if any
    pub fn record_id(&self) -> Option<i64> {
        match self {
            Error::MissingField { record_id, .. } | Error::MalformedRecord { record_id, .. } => {
                *record_id
            }
            _ => None,
        }
    }
}

fn describe_record(record_id: &Option<i64>) -> String {
    match record_id {
        Some(id) => format!("observation {}", id),
        None => "observation <unknown>".to_string(),
    }
}
