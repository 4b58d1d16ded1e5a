//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// A replay line could not be decoded
    #[error("failed to parse replay line {line} of {path}: {message}")]
    ParseFailed {
        path: String,
        line: usize,
        message: String,
    },

    /// Recording could not be read
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Channel closed
    #[error("channel closed for source {source_id}")]
    ChannelClosed { source_id: String },

    /// A source with this id is already registered
    #[error("source {source_id} is already registered")]
    DuplicateSource { source_id: String },
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
