//! Persistence seams
//!
//! Each trait method is one store operation. Methods that touch several
//! rows (document + first version, a new version replacing the previous
//! ones, a measurement, an audit with its process links, a new account)
//! must be applied atomically by implementations.

use crate::error::QualityResult;
use crate::models::*;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self) -> QualityResult<Vec<Document>>;

    async fn get_document(&self, id: i64) -> QualityResult<Option<Document>>;

    /// Insert the master row and its first version
    async fn create_document(
        &self,
        document: NewDocument,
        version: NewDocumentVersion,
    ) -> QualityResult<(Document, DocumentVersion)>;

    async fn update_document(
        &self,
        id: i64,
        title: String,
        category: DocumentCategory,
        process: String,
    ) -> QualityResult<Document>;

    async fn delete_document(&self, id: i64) -> QualityResult<()>;

    async fn list_versions(&self, document_id: i64) -> QualityResult<Vec<DocumentVersion>>;

    async fn list_all_versions(&self) -> QualityResult<Vec<DocumentVersion>>;

    async fn get_version(&self, id: i64) -> QualityResult<Option<DocumentVersion>>;

    /// Number the revision after the highest stored one, mark every
    /// non-obsolete version `obsoleto`, insert the new `vigente` version and
    /// set the master's `file_name`. Numbering happens inside the same
    /// atomic step so concurrent uploads get distinct revisions.
    async fn add_version(
        &self,
        document_id: i64,
        revision: NewRevision,
        file_name: String,
    ) -> QualityResult<DocumentVersion>;

    async fn update_version_description(&self, id: i64, description: String) -> QualityResult<()>;

    async fn update_version_status(&self, id: i64, status: DocumentStatus) -> QualityResult<DocumentVersion>;
}

#[async_trait]
pub trait IndicatorStore: Send + Sync {
    async fn list_indicators(&self) -> QualityResult<Vec<Indicator>>;

    async fn get_indicator(&self, id: i64) -> QualityResult<Option<Indicator>>;

    /// Insert; `id` and `created_at` of the argument are ignored
    async fn insert_indicator(&self, indicator: Indicator) -> QualityResult<Indicator>;

    /// Overwrite every editable column of an existing row
    async fn save_indicator(&self, indicator: Indicator) -> QualityResult<Indicator>;

    async fn delete_indicator(&self, id: i64) -> QualityResult<()>;

    /// Insert the history row and save the updated indicator
    async fn record_measurement(
        &self,
        indicator: Indicator,
        history: NewIndicatorHistory,
    ) -> QualityResult<(Indicator, IndicatorHistory)>;

    async fn list_history(&self, indicator_id: i64) -> QualityResult<Vec<IndicatorHistory>>;
}

#[async_trait]
pub trait ProcessStore: Send + Sync {
    async fn list_processes(&self) -> QualityResult<Vec<Process>>;

    async fn get_process(&self, id: i64) -> QualityResult<Option<Process>>;

    async fn insert_process(&self, process: NewProcess) -> QualityResult<Process>;

    /// Updates everything but `owner_id`
    async fn update_process(&self, id: i64, process: NewProcess) -> QualityResult<Process>;

    async fn delete_process(&self, id: i64) -> QualityResult<()>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn list_audits(&self) -> QualityResult<Vec<Audit>>;

    async fn get_audit(&self, id: i64) -> QualityResult<Option<Audit>>;

    /// Insert the audit and one relation row per process id
    async fn create_audit(&self, audit: NewAudit, process_ids: Vec<i64>) -> QualityResult<Audit>;

    async fn audit_process_ids(&self, audit_id: i64) -> QualityResult<Vec<i64>>;

    async fn update_audit_progress(
        &self,
        id: i64,
        progress: i32,
        status: AuditStatus,
    ) -> QualityResult<Audit>;

    async fn delete_audit(&self, id: i64) -> QualityResult<()>;

    async fn list_findings(&self, audit_id: i64) -> QualityResult<Vec<AuditFinding>>;

    async fn list_all_findings(&self) -> QualityResult<Vec<AuditFinding>>;

    async fn insert_finding(&self, finding: NewFinding) -> QualityResult<AuditFinding>;

    async fn update_finding_status(&self, id: i64, status: FindingStatus) -> QualityResult<AuditFinding>;

    async fn delete_finding(&self, id: i64) -> QualityResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert credential and profile; the first account ever is an editor
    async fn create_account(
        &self,
        credential: Credential,
        full_name: String,
    ) -> QualityResult<User>;

    async fn find_credential(&self, email: &str) -> QualityResult<Option<Credential>>;

    async fn find_user_by_auth_id(&self, auth_id: Uuid) -> QualityResult<Option<User>>;

    /// Stamp `last_access` and return the refreshed profile
    async fn touch_last_access(&self, auth_id: Uuid, at: DateTime<Utc>) -> QualityResult<Option<User>>;

    async fn list_users(&self) -> QualityResult<Vec<User>>;

    async fn get_user(&self, id: i64) -> QualityResult<Option<User>>;

    async fn update_role(&self, id: i64, role: UserRole) -> QualityResult<User>;

    /// Remove the profile and its credential
    async fn delete_user(&self, id: i64) -> QualityResult<()>;
}

/// Everything the quality service persists
#[async_trait]
pub trait QualityStore: DocumentStore + IndicatorStore + ProcessStore + AuditStore + UserStore {
    async fn is_healthy(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

/// Today's date as the stores see it
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
