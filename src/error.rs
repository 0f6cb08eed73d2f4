use thiserror::Error;

use crate::types::RawRow;

/// Convenience result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Granularity at which an error aborts work.
///
/// Ordered from the narrowest to the widest blast radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorScope {
    /// Only the offending row is skipped.
    Row,
    /// Only the offending transport entry is skipped.
    Entry,
    /// The current file cannot be processed; the invocation is aborted.
    File,
    /// The whole invocation failed.
    Invocation,
}

/// A time-of-day value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid time format '{raw}'")]
    InvalidTimeFormat { raw: String },
}

/// Why a single raw row could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorCause {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("required field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("field '{field}': {source}")]
    InvalidTime {
        field: &'static str,
        #[source]
        source: TimeError,
    },
}

/// A raw row that failed normalization, kept together with its cause for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct RowError {
    pub row: RawRow,
    pub cause: RowErrorCause,
}

/// Failure reading an object from the storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("io error reading {bucket}/{key}: {source}")]
    Io {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure writing to the keyed record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store rejected write for {performer}/{performance}: {message}")]
    Rejected {
        performer: String,
        performance: String,
        message: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Failure delivering an operator notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Error type for file-, entry- and invocation-level failures.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Underlying I/O error (e.g. reading an event or config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload bytes are not valid UTF-8.
    #[error("payload for '{name}' is not valid utf-8: {source}")]
    InvalidEncoding {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed, but is neither a list of rows nor an object with an `items` list.
    #[error("unsupported payload shape: {message}")]
    UnsupportedPayloadShape { message: String },

    /// No candidate decoder produced any rows.
    #[error("unsupported file format for '{name}'. Use .json or .csv")]
    UnsupportedFileFormat { name: String },

    /// A transport entry body is not a valid notification document.
    #[error("invalid envelope body: {message}")]
    InvalidEnvelope { message: String },

    /// The top-level invocation event could not be parsed.
    #[error("invalid event: {message}")]
    InvalidEvent { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every entry failed and nothing was written.
    #[error("failed to process any files ({errors} errors)")]
    NoFilesProcessed { errors: usize },

    /// Invalid configuration.
    #[error("config error: {message}")]
    Config { message: String },
}

impl LoaderError {
    /// How far this error reaches when raised inside an invocation.
    pub fn scope(&self) -> ErrorScope {
        match self {
            LoaderError::InvalidEnvelope { .. } => ErrorScope::Entry,
            LoaderError::InvalidEncoding { .. }
            | LoaderError::Csv(_)
            | LoaderError::Json(_)
            | LoaderError::UnsupportedPayloadShape { .. }
            | LoaderError::UnsupportedFileFormat { .. }
            | LoaderError::Storage(_) => ErrorScope::File,
            LoaderError::Io(_)
            | LoaderError::InvalidEvent { .. }
            | LoaderError::Store(_)
            | LoaderError::NoFilesProcessed { .. }
            | LoaderError::Config { .. } => ErrorScope::Invocation,
        }
    }
}

impl RowError {
    /// Row errors never reach past the row itself.
    pub fn scope(&self) -> ErrorScope {
        ErrorScope::Row
    }
}
