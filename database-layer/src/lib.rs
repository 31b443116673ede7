//! Database layer for the SGC Engine
//!
//! Thin wrapper over a PostgreSQL connection pool that owns the schema of the
//! quality-management tables:
//!
//! - `documents` / `document_versions` - controlled documents and their revisions
//! - `indicators` / `indicator_history` - KPIs and one row per measurement upload
//! - `processes` - process map (strategic, operational, support)
//! - `audits` / `audit_processes` / `audit_findings` - audit programme
//! - `users` / `auth_credentials` - profiles and password credentials
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use database_layer::{DatabasePool, PoolSettings};
//!
//! # async fn run() -> Result<(), database_layer::DatabaseError> {
//! let db = DatabasePool::new("postgresql://localhost/sgc", &PoolSettings::default()).await?;
//! db.migrate().await?;
//!
//! let healthy = db.is_healthy().await;
//! assert!(healthy);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;

pub use connection::*;
pub use error::*;
