use thiserror::Error;

/// Process-level error enum used by SGC Engine binaries
#[derive(Error, Debug)]
pub enum SgcError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Authentication/authorization errors
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SGC operations
pub type Result<T> = std::result::Result<T, SgcError>;

/// Log an error together with the context it happened in
pub fn log_error(context: &str, error: &SgcError) {
    tracing::error!(
        context = context,
        error = %error,
        "SGC error occurred"
    );
}
