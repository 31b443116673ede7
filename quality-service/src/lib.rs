//! Quality management service for SGC Engine
//!
//! Provides the domain of an ISO 9001 style quality dashboard:
//! - Controlled documents with coded names and revision history
//! - Indicators with periodic measurements, status and trend
//! - Process map and process ownership
//! - Internal/external audits, their scope and findings
//! - User profiles and roles
//! - Dashboard aggregation and PDF indicator reports
//!
//! Persistence is abstracted behind [`QualityStore`]; [`MemoryStore`] is the
//! in-process implementation and the server crate provides the PostgreSQL
//! one.

pub mod audits;
pub mod documents;
pub mod error;
pub mod indicators;
pub mod memory;
pub mod models;
pub mod processes;
pub mod reporting;
pub mod service;
pub mod store;
pub mod users;

pub use documents::DocumentFilter;
pub use error::*;
pub use memory::MemoryStore;
pub use models::*;
pub use service::*;
pub use store::*;
