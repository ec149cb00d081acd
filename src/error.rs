//! Error types for the tracking engine
//!
//! Only [`StartupError`] is fatal. The per-cycle errors are contained inside the
//! worker that hit them and surface as log lines.

use std::path::PathBuf;

/// Failure to obtain a fresh snapshot for an identifier. Skips the cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("status table #{index} not found ({found} tables on page)")]
    MissingTable { index: usize, found: usize },

    #[error("malformed status table: {0}")]
    MalformedTable(String),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Short machine-friendly kind for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(_) => "http",
            FetchError::Status { .. } => "status",
            FetchError::MissingTable { .. } => "missing_table",
            FetchError::MalformedTable(_) => "malformed_table",
            FetchError::Other(_) => "other",
        }
    }
}

/// Failure to read or write persisted state
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PersistError {
    pub fn kind(&self) -> &'static str {
        match self {
            PersistError::CreateDir { .. } => "create_dir",
            PersistError::Read { .. } => "read",
            PersistError::Write { .. } => "write",
            PersistError::Serialize(_) => "serialize",
        }
    }
}

/// Failure to deliver one alert. Never stops the remaining alerts.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to write alert: {0}")]
    Io(#[from] std::io::Error),

    #[error("sound command `{program}` failed: {detail}")]
    Sound { program: String, detail: String },

    #[error("{0}")]
    Other(String),
}

/// Aborts the whole run before any worker starts
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("storage directory {path} cannot be created: {source}")]
    StorageDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
