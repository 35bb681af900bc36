//! Error types for persister operations.

use thiserror::Error;

/// Errors surfaced by persister operations.
///
/// Whether an error propagates depends on the operation: explicit `save`
/// rejects with it, while background work (auto-load, auto-save, polling)
/// routes it to the optional ignored-error handler and carries on.
#[derive(Debug, Error)]
pub enum PersisterError {
    /// Persisted state could not be read.
    #[error("failed to read persisted content: {message}")]
    Read { message: String },

    /// Persisted state could not be written.
    #[error("failed to write persisted content: {source}")]
    Write {
        #[from]
        source: std::io::Error,
    },

    /// Persisted bytes could not be encoded or decoded.
    #[error("codec failure: {message}")]
    Codec { message: String },

    /// Generic error with message.
    #[error("{message}")]
    Other { message: String },
}
