//! Object storage for SGC Engine
//!
//! Uploaded documents live in buckets (the dashboard uses a single
//! `documents` bucket). Every upload gets a fresh `{uuid}.{ext}` key and a
//! public URL that the API serves back from `/files/{bucket}/{key}`.
//!
//! Two backends are provided:
//!
//! - [`FileSystemBackend`]: one directory per bucket, metadata in a sidecar
//!   `.meta.json` file next to each object
//! - [`MemoryBackend`]: process-local map, used in development and tests
//!
//! ```rust
//! use std::sync::Arc;
//! use document_storage::{MemoryBackend, ObjectStore};
//!
//! # async fn run() -> document_storage::StorageResult<()> {
//! let store = ObjectStore::new(Arc::new(MemoryBackend::new()), "http://localhost:8080");
//! let uploaded = store.upload("documents", "Manual de Calidad.pdf", b"%PDF".to_vec()).await?;
//! assert!(uploaded.key.ends_with(".pdf"));
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod error;
pub mod storage;

pub use backends::{FileSystemBackend, MemoryBackend};
pub use error::*;
pub use storage::*;
