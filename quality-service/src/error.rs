use document_storage::StorageError;
use thiserror::Error;

/// Errors raised by the quality domain
///
/// Messages of `Validation`, `NotFound`, `Conflict` and `Forbidden` are
/// shown to end users as-is.
#[derive(Error, Debug)]
pub enum QualityError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Report generation error: {0}")]
    Report(String),
}

impl QualityError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

pub type QualityResult<T> = Result<T, QualityError>;
