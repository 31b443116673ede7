use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Unexpected column value: {0}")]
    InvalidValue(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Whether the underlying failure is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::SqlxError(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            DatabaseError::QueryFailed(msg) => msg.contains("duplicate key"),
            _ => false,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_message_is_unique_violation() {
        let err = DatabaseError::QueryFailed(
            "duplicate key value violates unique constraint \"documents_code_key\"".to_string(),
        );
        assert!(err.is_unique_violation());
        assert!(!DatabaseError::ConnectionFailed("refused".to_string()).is_unique_violation());
    }
}
