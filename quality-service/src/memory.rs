//! In-process [`QualityStore`]
//!
//! All tables live behind one `RwLock`, so each trait method is applied
//! atomically.

use crate::documents::{next_revision, version_description};
use crate::error::{QualityError, QualityResult};
use crate::models::*;
use crate::store::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    next_id: i64,
    documents: BTreeMap<i64, Document>,
    versions: BTreeMap<i64, DocumentVersion>,
    indicators: BTreeMap<i64, Indicator>,
    history: BTreeMap<i64, IndicatorHistory>,
    processes: BTreeMap<i64, Process>,
    audits: BTreeMap<i64, Audit>,
    audit_processes: BTreeSet<(i64, i64)>,
    findings: BTreeMap<i64, AuditFinding>,
    users: BTreeMap<i64, User>,
    credentials: BTreeMap<Uuid, Credential>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(message: &str) -> QualityError {
    QualityError::not_found(message)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self) -> QualityResult<Vec<Document>> {
        Ok(self.tables.read().await.documents.values().cloned().collect())
    }

    async fn get_document(&self, id: i64) -> QualityResult<Option<Document>> {
        Ok(self.tables.read().await.documents.get(&id).cloned())
    }

    async fn create_document(
        &self,
        document: NewDocument,
        version: NewDocumentVersion,
    ) -> QualityResult<(Document, DocumentVersion)> {
        let mut tables = self.tables.write().await;
        if tables.documents.values().any(|d| d.code == document.code) {
            return Err(QualityError::Conflict(format!(
                "Ya existe un documento con el código {}",
                document.code
            )));
        }

        let now = Utc::now();
        let doc = Document {
            id: tables.next_id(),
            code: document.code,
            title: document.title,
            category: document.category,
            process: document.process,
            file_name: document.file_name,
            created_by: document.created_by,
            created_at: now,
        };
        let ver = DocumentVersion {
            id: tables.next_id(),
            document_id: doc.id,
            revision: version.revision,
            file_url: version.file_url,
            status: version.status,
            description: version.description,
            uploaded_by: version.uploaded_by,
            created_at: now,
        };
        tables.documents.insert(doc.id, doc.clone());
        tables.versions.insert(ver.id, ver.clone());
        Ok((doc, ver))
    }

    async fn update_document(
        &self,
        id: i64,
        title: String,
        category: DocumentCategory,
        process: String,
    ) -> QualityResult<Document> {
        let mut tables = self.tables.write().await;
        let doc = tables
            .documents
            .get_mut(&id)
            .ok_or_else(|| missing("Documento no encontrado"))?;
        doc.title = title;
        doc.category = category;
        doc.process = process;
        Ok(doc.clone())
    }

    async fn delete_document(&self, id: i64) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .documents
            .remove(&id)
            .ok_or_else(|| missing("Documento no encontrado"))?;
        tables.versions.retain(|_, v| v.document_id != id);
        Ok(())
    }

    async fn list_versions(&self, document_id: i64) -> QualityResult<Vec<DocumentVersion>> {
        let tables = self.tables.read().await;
        let mut versions: Vec<DocumentVersion> = tables
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.revision.cmp(&a.revision).then(b.id.cmp(&a.id)));
        Ok(versions)
    }

    async fn list_all_versions(&self) -> QualityResult<Vec<DocumentVersion>> {
        Ok(self.tables.read().await.versions.values().cloned().collect())
    }

    async fn get_version(&self, id: i64) -> QualityResult<Option<DocumentVersion>> {
        Ok(self.tables.read().await.versions.get(&id).cloned())
    }

    async fn add_version(
        &self,
        document_id: i64,
        upload: NewRevision,
        file_name: String,
    ) -> QualityResult<DocumentVersion> {
        let mut tables = self.tables.write().await;
        if !tables.documents.contains_key(&document_id) {
            return Err(missing("Documento no encontrado"));
        }

        let latest = tables
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .map(|v| v.revision)
            .max();
        let revision = next_revision(latest)?;

        for existing in tables.versions.values_mut() {
            if existing.document_id == document_id && existing.status != DocumentStatus::Obsoleto {
                existing.status = DocumentStatus::Obsoleto;
            }
        }

        let ver = DocumentVersion {
            id: tables.next_id(),
            document_id,
            revision,
            file_url: upload.file_url,
            status: DocumentStatus::Vigente,
            description: version_description(upload.description, revision),
            uploaded_by: upload.uploaded_by,
            created_at: Utc::now(),
        };
        tables.versions.insert(ver.id, ver.clone());
        if let Some(doc) = tables.documents.get_mut(&document_id) {
            doc.file_name = file_name;
        }
        Ok(ver)
    }

    async fn update_version_description(&self, id: i64, description: String) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        let version = tables
            .versions
            .get_mut(&id)
            .ok_or_else(|| missing("Versión no encontrada"))?;
        version.description = description;
        Ok(())
    }

    async fn update_version_status(&self, id: i64, status: DocumentStatus) -> QualityResult<DocumentVersion> {
        let mut tables = self.tables.write().await;
        let version = tables
            .versions
            .get_mut(&id)
            .ok_or_else(|| missing("Versión no encontrada"))?;
        version.status = status;
        Ok(version.clone())
    }
}

#[async_trait]
impl IndicatorStore for MemoryStore {
    async fn list_indicators(&self) -> QualityResult<Vec<Indicator>> {
        Ok(self.tables.read().await.indicators.values().cloned().collect())
    }

    async fn get_indicator(&self, id: i64) -> QualityResult<Option<Indicator>> {
        Ok(self.tables.read().await.indicators.get(&id).cloned())
    }

    async fn insert_indicator(&self, mut indicator: Indicator) -> QualityResult<Indicator> {
        let mut tables = self.tables.write().await;
        indicator.id = tables.next_id();
        indicator.created_at = Utc::now();
        tables.indicators.insert(indicator.id, indicator.clone());
        Ok(indicator)
    }

    async fn save_indicator(&self, indicator: Indicator) -> QualityResult<Indicator> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .indicators
            .get_mut(&indicator.id)
            .ok_or_else(|| missing("Indicador no encontrado"))?;
        let created_at = existing.created_at;
        *existing = Indicator {
            created_at,
            ..indicator
        };
        Ok(existing.clone())
    }

    async fn delete_indicator(&self, id: i64) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .indicators
            .remove(&id)
            .ok_or_else(|| missing("Indicador no encontrado"))?;
        tables.history.retain(|_, h| h.indicator_id != id);
        Ok(())
    }

    async fn record_measurement(
        &self,
        indicator: Indicator,
        history: NewIndicatorHistory,
    ) -> QualityResult<(Indicator, IndicatorHistory)> {
        let mut tables = self.tables.write().await;
        if !tables.indicators.contains_key(&indicator.id) {
            return Err(missing("Indicador no encontrado"));
        }

        let row = IndicatorHistory {
            id: tables.next_id(),
            indicator_id: history.indicator_id,
            value_1: history.value_1,
            value_2: history.value_2,
            result: history.result,
            period_date: history.period_date,
            observations: history.observations,
            created_at: Utc::now(),
        };
        tables.history.insert(row.id, row.clone());
        tables.indicators.insert(indicator.id, indicator.clone());
        Ok((indicator, row))
    }

    async fn list_history(&self, indicator_id: i64) -> QualityResult<Vec<IndicatorHistory>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<IndicatorHistory> = tables
            .history
            .values()
            .filter(|h| h.indicator_id == indicator_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.period_date.cmp(&a.period_date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn list_processes(&self) -> QualityResult<Vec<Process>> {
        let tables = self.tables.read().await;
        let mut processes: Vec<Process> = tables.processes.values().cloned().collect();
        processes.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(processes)
    }

    async fn get_process(&self, id: i64) -> QualityResult<Option<Process>> {
        Ok(self.tables.read().await.processes.get(&id).cloned())
    }

    async fn insert_process(&self, process: NewProcess) -> QualityResult<Process> {
        let mut tables = self.tables.write().await;
        if tables.processes.values().any(|p| p.code == process.code) {
            return Err(QualityError::Conflict(format!(
                "Ya existe un proceso con el código {}",
                process.code
            )));
        }
        let row = Process {
            id: tables.next_id(),
            code: process.code,
            name: process.name,
            process_type: process.process_type,
            responsibles: process.responsibles,
            subprocesses: process.subprocesses,
            owner_id: process.owner_id,
            created_at: Utc::now(),
        };
        tables.processes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_process(&self, id: i64, process: NewProcess) -> QualityResult<Process> {
        let mut tables = self.tables.write().await;
        if tables
            .processes
            .values()
            .any(|p| p.id != id && p.code == process.code)
        {
            return Err(QualityError::Conflict(format!(
                "Ya existe un proceso con el código {}",
                process.code
            )));
        }
        let row = tables
            .processes
            .get_mut(&id)
            .ok_or_else(|| missing("Proceso no encontrado"))?;
        row.code = process.code;
        row.name = process.name;
        row.process_type = process.process_type;
        row.responsibles = process.responsibles;
        row.subprocesses = process.subprocesses;
        Ok(row.clone())
    }

    async fn delete_process(&self, id: i64) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .processes
            .remove(&id)
            .ok_or_else(|| missing("Proceso no encontrado"))?;
        tables.audit_processes.retain(|(_, process_id)| *process_id != id);
        for indicator in tables.indicators.values_mut() {
            if indicator.process_id == Some(id) {
                indicator.process_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn list_audits(&self) -> QualityResult<Vec<Audit>> {
        let tables = self.tables.read().await;
        let mut audits: Vec<Audit> = tables.audits.values().cloned().collect();
        audits.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date).then(a.id.cmp(&b.id)));
        Ok(audits)
    }

    async fn get_audit(&self, id: i64) -> QualityResult<Option<Audit>> {
        Ok(self.tables.read().await.audits.get(&id).cloned())
    }

    async fn create_audit(&self, audit: NewAudit, process_ids: Vec<i64>) -> QualityResult<Audit> {
        let mut tables = self.tables.write().await;
        let row = Audit {
            id: tables.next_id(),
            title: audit.title,
            scheduled_date: audit.scheduled_date,
            auditor: audit.auditor,
            audit_type: audit.audit_type,
            scope: audit.scope,
            progress: audit.progress,
            status: audit.status,
            created_at: Utc::now(),
        };
        for process_id in process_ids {
            tables.audit_processes.insert((row.id, process_id));
        }
        tables.audits.insert(row.id, row.clone());
        Ok(row)
    }

    async fn audit_process_ids(&self, audit_id: i64) -> QualityResult<Vec<i64>> {
        Ok(self
            .tables
            .read()
            .await
            .audit_processes
            .iter()
            .filter(|(audit, _)| *audit == audit_id)
            .map(|(_, process)| *process)
            .collect())
    }

    async fn update_audit_progress(
        &self,
        id: i64,
        progress: i32,
        status: AuditStatus,
    ) -> QualityResult<Audit> {
        let mut tables = self.tables.write().await;
        let audit = tables
            .audits
            .get_mut(&id)
            .ok_or_else(|| missing("Auditoría no encontrada"))?;
        audit.progress = progress;
        audit.status = status;
        Ok(audit.clone())
    }

    async fn delete_audit(&self, id: i64) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .audits
            .remove(&id)
            .ok_or_else(|| missing("Auditoría no encontrada"))?;
        tables.audit_processes.retain(|(audit_id, _)| *audit_id != id);
        tables.findings.retain(|_, f| f.audit_id != id);
        Ok(())
    }

    async fn list_findings(&self, audit_id: i64) -> QualityResult<Vec<AuditFinding>> {
        Ok(self
            .tables
            .read()
            .await
            .findings
            .values()
            .filter(|f| f.audit_id == audit_id)
            .cloned()
            .collect())
    }

    async fn list_all_findings(&self) -> QualityResult<Vec<AuditFinding>> {
        Ok(self.tables.read().await.findings.values().cloned().collect())
    }

    async fn insert_finding(&self, finding: NewFinding) -> QualityResult<AuditFinding> {
        let mut tables = self.tables.write().await;
        if !tables.audits.contains_key(&finding.audit_id) {
            return Err(missing("Auditoría no encontrada"));
        }
        let row = AuditFinding {
            id: tables.next_id(),
            audit_id: finding.audit_id,
            finding_type: finding.finding_type,
            description: finding.description,
            process: finding.process,
            status: FindingStatus::Abierta,
            created_at: Utc::now(),
        };
        tables.findings.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_finding_status(&self, id: i64, status: FindingStatus) -> QualityResult<AuditFinding> {
        let mut tables = self.tables.write().await;
        let finding = tables
            .findings
            .get_mut(&id)
            .ok_or_else(|| missing("Hallazgo no encontrado"))?;
        finding.status = status;
        Ok(finding.clone())
    }

    async fn delete_finding(&self, id: i64) -> QualityResult<()> {
        self.tables
            .write()
            .await
            .findings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("Hallazgo no encontrado"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_account(&self, credential: Credential, full_name: String) -> QualityResult<User> {
        let mut tables = self.tables.write().await;
        if tables.credentials.values().any(|c| c.email == credential.email) {
            return Err(QualityError::Conflict(
                "Ya existe una cuenta con ese email".to_string(),
            ));
        }

        let role = if tables.users.is_empty() {
            UserRole::Editor
        } else {
            UserRole::Lector
        };
        let user = User {
            id: tables.next_id(),
            auth_id: credential.auth_id,
            email: credential.email.clone(),
            full_name,
            role,
            last_access: None,
            created_at: Utc::now(),
        };
        tables.credentials.insert(credential.auth_id, credential);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_credential(&self, email: &str) -> QualityResult<Option<Credential>> {
        Ok(self
            .tables
            .read()
            .await
            .credentials
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn find_user_by_auth_id(&self, auth_id: Uuid) -> QualityResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.auth_id == auth_id)
            .cloned())
    }

    async fn touch_last_access(&self, auth_id: Uuid, at: DateTime<Utc>) -> QualityResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .users
            .values_mut()
            .find(|u| u.auth_id == auth_id)
            .map(|user| {
                user.last_access = Some(at);
                user.clone()
            }))
    }

    async fn list_users(&self) -> QualityResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i64) -> QualityResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_role(&self, id: i64, role: UserRole) -> QualityResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| missing("Usuario no encontrado"))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> QualityResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .remove(&id)
            .ok_or_else(|| missing("Usuario no encontrado"))?;
        tables.credentials.remove(&user.auth_id);
        Ok(())
    }
}

#[async_trait]
impl QualityStore for MemoryStore {
    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_version(revision: i32, status: DocumentStatus) -> NewDocumentVersion {
        NewDocumentVersion {
            revision,
            file_url: format!("http://localhost/files/documents/r{}.pdf", revision),
            status,
            description: String::new(),
            uploaded_by: None,
        }
    }

    fn revision_upload(description: Option<&str>) -> NewRevision {
        NewRevision {
            file_url: "http://localhost/files/documents/next.pdf".to_string(),
            description: description.map(str::to_string),
            uploaded_by: None,
        }
    }

    fn new_document(code: &str) -> NewDocument {
        NewDocument {
            code: code.to_string(),
            title: "Manual de Calidad".to_string(),
            category: DocumentCategory::Manual,
            process: String::new(),
            file_name: "manual.pdf".to_string(),
            created_by: None,
        }
    }

    fn credential(email: &str) -> Credential {
        Credential {
            auth_id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_document_code_conflicts() {
        let store = MemoryStore::new();
        store
            .create_document(new_document("MA-001"), new_version(0, DocumentStatus::Vigente))
            .await
            .unwrap();
        let result = store
            .create_document(new_document("MA-001"), new_version(0, DocumentStatus::Vigente))
            .await;
        assert!(matches!(result, Err(QualityError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_version_obsoletes_previous() {
        let store = MemoryStore::new();
        let (doc, _) = store
            .create_document(new_document("MA-001"), new_version(0, DocumentStatus::Vigente))
            .await
            .unwrap();
        let added = store
            .add_version(doc.id, revision_upload(None), "v1.pdf".to_string())
            .await
            .unwrap();
        assert_eq!(added.revision, 1);
        assert_eq!(added.description, "Actualización a Rev 1");

        let versions = store.list_versions(doc.id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].revision, 1);
        assert_eq!(versions[0].status, DocumentStatus::Vigente);
        assert_eq!(versions[1].status, DocumentStatus::Obsoleto);
        assert_eq!(store.get_document(doc.id).await.unwrap().unwrap().file_name, "v1.pdf");
    }

    #[tokio::test]
    async fn test_add_version_numbers_after_highest_revision() {
        let store = MemoryStore::new();
        let (doc, _) = store
            .create_document(new_document("MA-001"), new_version(4, DocumentStatus::Vigente))
            .await
            .unwrap();
        let added = store
            .add_version(doc.id, revision_upload(Some("Cambio de alcance")), "v5.pdf".to_string())
            .await
            .unwrap();
        assert_eq!(added.revision, 5);
        assert_eq!(added.description, "Cambio de alcance");

        let (capped, _) = store
            .create_document(
                new_document("MA-002"),
                new_version(crate::documents::MAX_REVISION, DocumentStatus::Vigente),
            )
            .await
            .unwrap();
        let result = store
            .add_version(capped.id, revision_upload(None), "x.pdf".to_string())
            .await;
        assert!(matches!(result, Err(QualityError::Validation(_))));
        assert_eq!(store.list_versions(capped.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_version_missing_document() {
        let store = MemoryStore::new();
        let result = store
            .add_version(42, revision_upload(None), "x.pdf".to_string())
            .await;
        assert!(matches!(result, Err(QualityError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_document_removes_versions() {
        let store = MemoryStore::new();
        let (doc, _) = store
            .create_document(new_document("MA-001"), new_version(0, DocumentStatus::Vigente))
            .await
            .unwrap();
        store.delete_document(doc.id).await.unwrap();
        assert!(store.list_all_versions().await.unwrap().is_empty());
        assert!(matches!(
            store.delete_document(doc.id).await,
            Err(QualityError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_first_account_is_editor() {
        let store = MemoryStore::new();
        let first = store
            .create_account(credential("a@x.com"), "Ana".to_string())
            .await
            .unwrap();
        let second = store
            .create_account(credential("b@x.com"), "Beto".to_string())
            .await
            .unwrap();
        assert_eq!(first.role, UserRole::Editor);
        assert_eq!(second.role, UserRole::Lector);

        let duplicate = store.create_account(credential("a@x.com"), String::new()).await;
        assert!(matches!(duplicate, Err(QualityError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_user_removes_credential() {
        let store = MemoryStore::new();
        let user = store
            .create_account(credential("a@x.com"), String::new())
            .await
            .unwrap();
        store.delete_user(user.id).await.unwrap();
        assert!(store.find_credential("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_audit_cascades() {
        let store = MemoryStore::new();
        let audit = store
            .create_audit(
                NewAudit {
                    title: "Auditoría interna".to_string(),
                    scheduled_date: None,
                    auditor: String::new(),
                    audit_type: AuditType::Interna,
                    scope: vec![],
                    progress: 0,
                    status: AuditStatus::Programada,
                },
                vec![7, 8],
            )
            .await
            .unwrap();
        store
            .insert_finding(NewFinding {
                audit_id: audit.id,
                finding_type: FindingType::Menor,
                description: "x".to_string(),
                process: String::new(),
            })
            .await
            .unwrap();

        assert_eq!(store.audit_process_ids(audit.id).await.unwrap(), vec![7, 8]);
        store.delete_audit(audit.id).await.unwrap();
        assert!(store.audit_process_ids(audit.id).await.unwrap().is_empty());
        assert!(store.list_all_findings().await.unwrap().is_empty());
    }
}
