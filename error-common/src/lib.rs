//! Common error handling utilities for SGC Engine
//!
//! Provides the process-level error type used by binaries and the stable
//! error codes that the HTTP layer attaches to every error response.
//!
//! # Error Categories
//!
//! - **ValidationError**: rejected form input (missing title, bad period, ...)
//! - **AuthError**: sign-in, token and role failures
//! - **DatabaseError**: pool and query failures
//! - **StorageError**: object store failures while uploading documents
//! - **ConfigError**: invalid or incomplete server configuration
//!
//! # Example
//!
//! ```rust
//! use error_common::{SgcError, Result};
//!
//! fn parse_port(raw: &str) -> Result<u16> {
//!     raw.parse()
//!         .map_err(|_| SgcError::ConfigError(format!("invalid port: {}", raw)))
//! }
//!
//! assert!(parse_port("8080").is_ok());
//! assert!(parse_port("http").is_err());
//! ```

pub mod types;
pub mod codes;

pub use types::*;
pub use codes::*;
