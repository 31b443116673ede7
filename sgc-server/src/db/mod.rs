//! PostgreSQL implementation of the quality store
//!
//! Every multi-row store operation runs in a single transaction.

pub mod audit_repository;
pub mod document_repository;
pub mod indicator_repository;
pub mod process_repository;
pub mod rows;
pub mod user_repository;

use async_trait::async_trait;
use database_layer::connection::DatabasePool;
use database_layer::error::DatabaseError;
use quality_service::{QualityError, QualityResult, QualityStore};
use sqlx::PgPool;
use std::str::FromStr;

#[derive(Clone)]
pub struct PgQualityStore {
    pool: DatabasePool,
}

impl PgQualityStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        self.pool.pool()
    }
}

/// Map a driver error; unique violations become conflicts with `conflict`
pub(crate) fn db_error(err: sqlx::Error, conflict: &str) -> QualityError {
    let err = DatabaseError::from(err);
    if err.is_unique_violation() {
        QualityError::Conflict(conflict.to_string())
    } else {
        tracing::error!(error = %err, "Database operation failed");
        QualityError::Database(err.to_string())
    }
}

/// Driver error with no expected constraint
pub(crate) fn query_error(err: sqlx::Error) -> QualityError {
    db_error(err, "Ya existe un registro con esos datos")
}

/// Parse a label column back into its enum
pub(crate) fn parse_label<T: FromStr>(value: &str) -> QualityResult<T> {
    value.parse().map_err(|_| {
        QualityError::Database(DatabaseError::InvalidValue(value.to_string()).to_string())
    })
}

/// `NotFound` when an UPDATE/DELETE touched no row
pub(crate) fn ensure_affected(rows: u64, message: &str) -> QualityResult<()> {
    if rows == 0 {
        Err(QualityError::not_found(message))
    } else {
        Ok(())
    }
}

#[async_trait]
impl QualityStore for PgQualityStore {
    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quality_service::Frequency;

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label::<Frequency>("Mensual").unwrap(), Frequency::Mensual);
        assert!(matches!(
            parse_label::<Frequency>("Quincenal"),
            Err(QualityError::Database(_))
        ));
    }

    #[test]
    fn test_ensure_affected() {
        assert!(ensure_affected(1, "Documento no encontrado").is_ok());
        assert!(matches!(
            ensure_affected(0, "Documento no encontrado"),
            Err(QualityError::NotFound(_))
        ));
    }

    #[test]
    fn test_row_not_found_is_not_a_conflict() {
        assert!(matches!(query_error(sqlx::Error::RowNotFound), QualityError::Database(_)));
    }
}
