use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, querying or enriching documents.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no schema registered for version '{version}' (key {key})")]
    UnknownSchemaVersion { version: String, key: String },

    #[error("document has no version tag")]
    MissingVersion,

    #[error("document is not a JSON object: {0}")]
    InvalidDocument(String),

    /// A field path named a key that the record does not declare.
    #[error("unknown field '{field}' on {owner}")]
    UnknownField { field: String, owner: String },

    #[error("invalid filter at offset {offset}: {reason}")]
    InvalidFilter { offset: usize, reason: String },

    /// A remote call was required but no API key is configured.
    #[error("no API key configured; set NTARC_API_KEY or pass --api-key")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("no remote entity found for {0}")]
    EntityNotFound(String),

    #[error("corrupt cache file {path}: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    #[error("invalid corpus pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
