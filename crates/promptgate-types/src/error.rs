use thiserror::Error;

use crate::llm::LlmError;

/// Errors from ledger persistence operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

/// Request-fatal errors from the chat pipeline.
///
/// Every variant maps to exactly one HTTP status and machine-readable
/// code at the API boundary. None of these are used for expected control
/// flow: "quota ok" is a normal return, not an absence of error.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unknown model: '{0}'")]
    UnknownModel(String),

    #[error("rate limited: {reason}")]
    RateLimited { reason: String },

    /// The fitter produced an empty trim: even the most recent message
    /// together with the system prompt exceeds the context budget.
    #[error("message is too long for the model's context window")]
    MessageTooLong,

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
