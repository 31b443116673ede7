use crate::audits::{audit_stats, finding_summary, scoped_process_ids, validate_progress};
use crate::documents::{
    build_record, build_records, category_counts, generate_code, validate_revision, DocumentFilter,
};
use crate::error::{QualityError, QualityResult};
use crate::indicators::{apply_measurement, parse_period, summarize};
use crate::models::*;
use crate::processes::{parse_subprocesses, process_map};
use crate::reporting::{build_dashboard, indicator_report_pdf, Dashboard, DashboardInput};
use crate::store::{today, QualityStore};
use crate::users::user_stats;
use chrono::Utc;
use document_storage::{ObjectStore, DOCUMENTS_BUCKET};
use logger_redacted::{redacted_info, redacted_warn};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Quality management service
///
/// Owns the business rules; persistence goes through [`QualityStore`] and
/// uploaded files through [`ObjectStore`].
#[derive(Clone)]
pub struct QualityService {
    store: Arc<dyn QualityStore>,
    objects: ObjectStore,
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

impl QualityService {
    pub fn new(store: Arc<dyn QualityStore>, objects: ObjectStore) -> Self {
        Self { store, objects }
    }

    pub fn store(&self) -> &Arc<dyn QualityStore> {
        &self.store
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub async fn list_documents(&self, filter: &DocumentFilter) -> QualityResult<Vec<DocumentRecord>> {
        let documents = self.store.list_documents().await?;
        let versions = self.store.list_all_versions().await?;
        Ok(build_records(&documents, &versions)
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    pub async fn get_document(&self, id: i64) -> QualityResult<DocumentRecord> {
        let document = self
            .store
            .get_document(id)
            .await?
            .ok_or_else(|| QualityError::not_found("Documento no encontrado"))?;
        let versions = self.store.list_versions(id).await?;
        Ok(build_record(&document, &versions))
    }

    pub async fn category_counts(&self) -> QualityResult<Vec<CategoryCount>> {
        Ok(category_counts(&self.store.list_documents().await?))
    }

    /// Upload the file, then write master and first version together
    pub async fn create_document(
        &self,
        actor: &User,
        input: DocumentInput,
        file: FileUpload,
    ) -> QualityResult<DocumentRecord> {
        if !required(&input.title) {
            return Err(QualityError::validation("El título del documento es obligatorio."));
        }
        if file.data.is_empty() {
            return Err(QualityError::validation("Archivo requerido para documento nuevo"));
        }
        let code = generate_code(input.category, &input.number)?;
        let revision = input.revision.unwrap_or(0);
        validate_revision(revision)?;

        let uploaded = self
            .objects
            .upload(DOCUMENTS_BUCKET, &file.file_name, file.data)
            .await?;

        let created = self
            .store
            .create_document(
                NewDocument {
                    code: code.clone(),
                    title: input.title.trim().to_string(),
                    category: input.category,
                    process: input.process,
                    file_name: file.file_name,
                    created_by: Some(actor.id),
                },
                NewDocumentVersion {
                    revision,
                    file_url: uploaded.public_url.clone(),
                    status: input.status.unwrap_or_default(),
                    description: input.description,
                    uploaded_by: Some(actor.id),
                },
            )
            .await;

        let (document, version) = match created {
            Ok(rows) => rows,
            Err(e) => {
                self.discard_upload(&uploaded.key).await;
                return Err(e);
            }
        };

        info!(document_id = document.id, code = %code, revision, "Document created");
        Ok(build_record(&document, &[version]))
    }

    pub async fn update_document(&self, id: i64, update: DocumentUpdate) -> QualityResult<DocumentRecord> {
        if !required(&update.title) {
            return Err(QualityError::validation("El título del documento es obligatorio."));
        }
        let current = self.get_document(id).await?;

        self.store
            .update_document(id, update.title.trim().to_string(), update.category, update.process)
            .await?;

        if let (Some(description), Some(version_id)) = (update.description, current.version_id) {
            if description != current.description {
                self.store
                    .update_version_description(version_id, description)
                    .await?;
            }
        }

        debug!(document_id = id, "Document metadata updated");
        self.get_document(id).await
    }

    pub async fn delete_document(&self, id: i64) -> QualityResult<()> {
        let versions = self.store.list_versions(id).await?;
        self.store.delete_document(id).await?;

        for version in versions {
            if let Some((bucket, key)) = self.objects.locate(&version.file_url) {
                if let Err(e) = self.objects.delete(&bucket, &key).await {
                    warn!(document_id = id, key = %key, error = %e, "Failed to delete stored file");
                }
            }
        }
        info!(document_id = id, "Document deleted");
        Ok(())
    }

    pub async fn list_versions(&self, document_id: i64) -> QualityResult<Vec<DocumentVersion>> {
        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| QualityError::not_found("Documento no encontrado"))?;
        self.store.list_versions(document_id).await
    }

    /// Publish a new revision; previous versions become obsolete
    pub async fn add_version(
        &self,
        actor: &User,
        document_id: i64,
        description: Option<String>,
        file: FileUpload,
    ) -> QualityResult<DocumentVersion> {
        if file.data.is_empty() {
            return Err(QualityError::validation("Debe seleccionar un archivo para la nueva versión"));
        }
        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| QualityError::not_found("Documento no encontrado"))?;

        let uploaded = self
            .objects
            .upload(DOCUMENTS_BUCKET, &file.file_name, file.data)
            .await?;

        let added = self
            .store
            .add_version(
                document_id,
                NewRevision {
                    file_url: uploaded.public_url.clone(),
                    description,
                    uploaded_by: Some(actor.id),
                },
                file.file_name,
            )
            .await;

        match added {
            Ok(version) => {
                info!(
                    document_id,
                    revision = version.revision,
                    version_id = version.id,
                    "Document version published"
                );
                Ok(version)
            }
            Err(e) => {
                self.discard_upload(&uploaded.key).await;
                Err(e)
            }
        }
    }

    pub async fn change_version_status(
        &self,
        version_id: i64,
        status: DocumentStatus,
    ) -> QualityResult<DocumentVersion> {
        let version = self
            .store
            .get_version(version_id)
            .await?
            .ok_or_else(|| QualityError::not_found("Versión no encontrada"))?;

        if !version.status.can_transition_to(status) {
            return Err(QualityError::validation(format!(
                "No se puede pasar de '{}' a '{}'",
                version.status, status
            )));
        }

        let updated = self.store.update_version_status(version_id, status).await?;
        info!(version_id, from = %version.status, to = %status, "Document version status changed");
        Ok(updated)
    }

    async fn discard_upload(&self, key: &str) {
        if let Err(e) = self.objects.delete(DOCUMENTS_BUCKET, key).await {
            warn!(key = %key, error = %e, "Failed to discard orphaned upload");
        }
    }

    // -----------------------------------------------------------------------
    // Indicators
    // -----------------------------------------------------------------------

    pub async fn list_indicators(&self) -> QualityResult<Vec<Indicator>> {
        self.store.list_indicators().await
    }

    pub async fn get_indicator(&self, id: i64) -> QualityResult<Indicator> {
        self.store
            .get_indicator(id)
            .await?
            .ok_or_else(|| QualityError::not_found("Indicador no encontrado"))
    }

    async fn resolve_process_name(&self, input: &IndicatorInput) -> QualityResult<(i64, String)> {
        let process_id = match input.process_id {
            Some(id) if required(&input.name) => id,
            _ => {
                return Err(QualityError::validation(
                    "El nombre y el proceso son obligatorios.",
                ))
            }
        };
        let process = self
            .store
            .get_process(process_id)
            .await?
            .ok_or_else(|| QualityError::not_found("Proceso no encontrado"))?;
        Ok((process.id, process.name))
    }

    pub async fn create_indicator(&self, input: IndicatorInput) -> QualityResult<Indicator> {
        let (process_id, process) = self.resolve_process_name(&input).await?;
        let today = today();

        let indicator = Indicator {
            id: 0,
            name: input.name.trim().to_string(),
            process_id: Some(process_id),
            process,
            objective: input.objective,
            target_value: input.target_value.unwrap_or(0.0),
            current_value: input.current_value.unwrap_or(0.0),
            unit: input
                .unit
                .filter(|u| required(u))
                .unwrap_or_else(|| "%".to_string()),
            input_1: input.input_1,
            input_2: input.input_2,
            formula: input.formula,
            calculation_info: input.calculation_info,
            frequency: input.frequency,
            responsible: input.responsible,
            status: IndicatorStatus::EnProceso,
            trend: Trend::Stable,
            last_period_value: None,
            period_start_date: Some(today),
            last_update: Some(today),
            created_at: Utc::now(),
        };

        let created = self.store.insert_indicator(indicator).await?;
        info!(indicator_id = created.id, frequency = %created.frequency, "Indicator created");
        Ok(created)
    }

    /// Edit definition fields; status, trend and the period are untouched
    pub async fn update_indicator(&self, id: i64, input: IndicatorInput) -> QualityResult<Indicator> {
        let mut indicator = self.get_indicator(id).await?;
        let (process_id, process) = self.resolve_process_name(&input).await?;

        indicator.name = input.name.trim().to_string();
        indicator.process_id = Some(process_id);
        indicator.process = process;
        indicator.objective = input.objective;
        indicator.target_value = input.target_value.unwrap_or(indicator.target_value);
        indicator.current_value = input.current_value.unwrap_or(indicator.current_value);
        if let Some(unit) = input.unit.filter(|u| required(u)) {
            indicator.unit = unit;
        }
        indicator.input_1 = input.input_1;
        indicator.input_2 = input.input_2;
        indicator.formula = input.formula;
        indicator.calculation_info = input.calculation_info;
        indicator.frequency = input.frequency;
        indicator.responsible = input.responsible;
        indicator.last_update = Some(today());

        self.store.save_indicator(indicator).await
    }

    pub async fn delete_indicator(&self, id: i64) -> QualityResult<()> {
        self.store.delete_indicator(id).await?;
        info!(indicator_id = id, "Indicator deleted");
        Ok(())
    }

    pub async fn record_measurement(
        &self,
        id: i64,
        input: MeasurementInput,
    ) -> QualityResult<(Indicator, IndicatorHistory)> {
        if !input.value_1.is_finite() || !input.value_2.is_finite() {
            return Err(QualityError::validation("Los valores de la medición deben ser numéricos"));
        }
        let today = today();
        let period_date = parse_period(&input.period, today)?;
        let mut indicator = self.get_indicator(id).await?;

        let outcome = apply_measurement(&indicator, input.value_1, input.value_2, today);
        outcome.apply_to(&mut indicator);

        let (indicator, history) = self
            .store
            .record_measurement(
                indicator,
                NewIndicatorHistory {
                    indicator_id: id,
                    value_1: input.value_1,
                    value_2: input.value_2,
                    result: outcome.result,
                    period_date,
                    observations: input.observations,
                },
            )
            .await?;

        info!(
            indicator_id = id,
            result = outcome.result,
            period_closed = outcome.period_closed,
            status = %indicator.status,
            trend = %indicator.trend,
            "Measurement recorded"
        );
        Ok((indicator, history))
    }

    pub async fn indicator_history(&self, id: i64) -> QualityResult<Vec<IndicatorHistory>> {
        self.get_indicator(id).await?;
        self.store.list_history(id).await
    }

    pub async fn indicator_summary(&self) -> QualityResult<IndicatorSummary> {
        Ok(summarize(&self.store.list_indicators().await?))
    }

    pub async fn indicator_report(&self) -> QualityResult<Vec<u8>> {
        let indicators = self.store.list_indicators().await?;
        let pdf = indicator_report_pdf(&indicators, today())?;
        debug!(indicators = indicators.len(), bytes = pdf.len(), "Indicator report generated");
        Ok(pdf)
    }

    // -----------------------------------------------------------------------
    // Processes
    // -----------------------------------------------------------------------

    pub async fn list_processes(&self) -> QualityResult<Vec<Process>> {
        self.store.list_processes().await
    }

    pub async fn get_process(&self, id: i64) -> QualityResult<Process> {
        self.store
            .get_process(id)
            .await?
            .ok_or_else(|| QualityError::not_found("Proceso no encontrado"))
    }

    fn new_process(input: ProcessInput, owner_id: Option<i64>) -> QualityResult<NewProcess> {
        if !required(&input.name) || !required(&input.code) {
            return Err(QualityError::validation("Nombre y Código son obligatorios"));
        }
        Ok(NewProcess {
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            process_type: input.process_type,
            responsibles: input.responsibles,
            subprocesses: parse_subprocesses(&input.subprocesses),
            owner_id,
        })
    }

    pub async fn create_process(&self, actor: &User, input: ProcessInput) -> QualityResult<Process> {
        let process = self
            .store
            .insert_process(Self::new_process(input, Some(actor.id))?)
            .await?;
        info!(process_id = process.id, code = %process.code, "Process created");
        Ok(process)
    }

    pub async fn update_process(&self, id: i64, input: ProcessInput) -> QualityResult<Process> {
        self.store
            .update_process(id, Self::new_process(input, None)?)
            .await
    }

    pub async fn delete_process(&self, id: i64) -> QualityResult<()> {
        self.store.delete_process(id).await?;
        info!(process_id = id, "Process deleted");
        Ok(())
    }

    pub async fn process_map(&self) -> QualityResult<Vec<ProcessGroup>> {
        Ok(process_map(&self.store.list_processes().await?))
    }

    // -----------------------------------------------------------------------
    // Audits
    // -----------------------------------------------------------------------

    pub async fn list_audits(&self) -> QualityResult<Vec<Audit>> {
        self.store.list_audits().await
    }

    pub async fn get_audit(&self, id: i64) -> QualityResult<AuditDetail> {
        let audit = self
            .store
            .get_audit(id)
            .await?
            .ok_or_else(|| QualityError::not_found("Auditoría no encontrada"))?;
        let process_ids = self.store.audit_process_ids(id).await?;
        let findings = self.store.list_findings(id).await?;
        Ok(AuditDetail {
            audit,
            process_ids,
            findings_summary: finding_summary(&findings),
            findings,
        })
    }

    pub async fn create_audit(&self, input: AuditInput) -> QualityResult<Audit> {
        if !required(&input.title) {
            return Err(QualityError::validation("El título de la auditoría es obligatorio."));
        }
        let processes = self.store.list_processes().await?;
        let process_ids = scoped_process_ids(&input.scope, &processes);

        let audit = self
            .store
            .create_audit(
                NewAudit {
                    title: input.title.trim().to_string(),
                    scheduled_date: input.scheduled_date,
                    auditor: input.auditor,
                    audit_type: input.audit_type,
                    scope: input.scope,
                    progress: 0,
                    status: AuditStatus::from_progress(0),
                },
                process_ids,
            )
            .await?;

        info!(audit_id = audit.id, audit_type = %audit.audit_type, "Audit scheduled");
        Ok(audit)
    }

    pub async fn update_audit_progress(&self, id: i64, progress: i32) -> QualityResult<Audit> {
        let progress = validate_progress(progress)?;
        let audit = self
            .store
            .update_audit_progress(id, progress, AuditStatus::from_progress(progress))
            .await?;
        debug!(audit_id = id, progress, status = %audit.status, "Audit progress updated");
        Ok(audit)
    }

    pub async fn delete_audit(&self, id: i64) -> QualityResult<()> {
        self.store.delete_audit(id).await?;
        info!(audit_id = id, "Audit deleted");
        Ok(())
    }

    pub async fn audit_stats(&self) -> QualityResult<AuditStats> {
        Ok(audit_stats(&self.store.list_audits().await?))
    }

    pub async fn list_findings(&self, audit_id: i64) -> QualityResult<Vec<AuditFinding>> {
        self.get_audit(audit_id).await?;
        self.store.list_findings(audit_id).await
    }

    pub async fn create_finding(&self, audit_id: i64, input: FindingInput) -> QualityResult<AuditFinding> {
        if !required(&input.description) {
            return Err(QualityError::validation("La descripción del hallazgo es obligatoria."));
        }
        let finding = self
            .store
            .insert_finding(NewFinding {
                audit_id,
                finding_type: input.finding_type,
                description: input.description.trim().to_string(),
                process: input.process,
            })
            .await?;
        info!(audit_id, finding_id = finding.id, finding_type = %finding.finding_type, "Finding registered");
        Ok(finding)
    }

    pub async fn update_finding_status(&self, id: i64, status: FindingStatus) -> QualityResult<AuditFinding> {
        self.store.update_finding_status(id, status).await
    }

    pub async fn delete_finding(&self, id: i64) -> QualityResult<()> {
        self.store.delete_finding(id).await
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub async fn create_account(&self, credential: Credential, full_name: String) -> QualityResult<User> {
        let email = credential.email.clone();
        let user = self
            .store
            .create_account(credential, full_name.trim().to_string())
            .await?;
        redacted_info!("Account created for {} with role {}", email, user.role);
        Ok(user)
    }

    pub async fn find_credential(&self, email: &str) -> QualityResult<Option<Credential>> {
        self.store.find_credential(email).await
    }

    /// Profile for an authenticated identity, without side effects
    pub async fn current_user(&self, auth_id: Uuid) -> QualityResult<Option<User>> {
        self.store.find_user_by_auth_id(auth_id).await
    }

    /// Profile fetch after sign-in; stamps `last_access`
    pub async fn load_profile(&self, auth_id: Uuid) -> QualityResult<Option<User>> {
        let user = self.store.touch_last_access(auth_id, Utc::now()).await?;
        if user.is_none() {
            redacted_warn!("No profile for auth id {}", auth_id);
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> QualityResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn user_stats(&self) -> QualityResult<UserStats> {
        Ok(user_stats(&self.store.list_users().await?))
    }

    pub async fn change_role(&self, actor: &User, id: i64, role: UserRole) -> QualityResult<User> {
        if !actor.is_editor() {
            return Err(QualityError::Forbidden(
                "Solo los editores pueden cambiar roles".to_string(),
            ));
        }
        let user = self.store.update_role(id, role).await?;
        info!(user_id = id, role = %role, changed_by = actor.id, "User role changed");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &User, id: i64) -> QualityResult<()> {
        if !actor.is_editor() {
            return Err(QualityError::Forbidden(
                "Solo los editores pueden eliminar usuarios".to_string(),
            ));
        }
        if actor.id == id {
            return Err(QualityError::validation("No puedes eliminar tu propio usuario"));
        }
        self.store.delete_user(id).await?;
        info!(user_id = id, deleted_by = actor.id, "User deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    pub async fn dashboard(&self) -> QualityResult<Dashboard> {
        let documents = self.store.list_documents().await?;
        let versions = self.store.list_all_versions().await?;
        let indicators = self.store.list_indicators().await?;
        let audits = self.store.list_audits().await?;
        let findings = self.store.list_all_findings().await?;

        Ok(build_dashboard(
            DashboardInput {
                documents: &documents,
                versions: &versions,
                indicators: &indicators,
                audits: &audits,
                findings: &findings,
            },
            today(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use document_storage::{MemoryBackend, ObjectMetadata, StorageBackend, StorageResult, StoredObject};

    fn service() -> QualityService {
        QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(Arc::new(MemoryBackend::new()), "http://localhost:8080"),
        )
    }

    async fn editor(service: &QualityService) -> User {
        service
            .create_account(
                Credential {
                    auth_id: Uuid::new_v4(),
                    email: "editor@empresa.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                "Editora Principal".to_string(),
            )
            .await
            .unwrap()
    }

    fn pdf(name: &str) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            data: b"%PDF-1.5 test".to_vec(),
        }
    }

    fn document_input(number: &str) -> DocumentInput {
        DocumentInput {
            category: DocumentCategory::ProcedimientoGeneral,
            number: number.to_string(),
            title: "Control de documentos".to_string(),
            process: "Gestión de Calidad".to_string(),
            revision: None,
            status: None,
            description: "Versión inicial".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_document_defaults() {
        let service = service();
        let actor = editor(&service).await;

        let record = service
            .create_document(&actor, document_input("7"), pdf("control.pdf"))
            .await
            .unwrap();

        assert_eq!(record.code, "PG-007");
        assert_eq!(record.revision, Some(0));
        assert_eq!(record.status, Some(DocumentStatus::EnRevision));
        assert_eq!(record.file_name, "control.pdf");
        assert!(record.file_url.unwrap().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_create_document_requires_file() {
        let service = service();
        let actor = editor(&service).await;
        let empty = FileUpload {
            file_name: "vacio.pdf".to_string(),
            data: vec![],
        };

        let result = service.create_document(&actor, document_input("1"), empty).await;
        assert!(matches!(result, Err(QualityError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_code_discards_upload() {
        let backend = Arc::new(MemoryBackend::new());
        let service = QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(backend.clone(), "http://localhost:8080"),
        );
        let actor = editor(&service).await;

        service
            .create_document(&actor, document_input("1"), pdf("a.pdf"))
            .await
            .unwrap();
        let result = service
            .create_document(&actor, document_input("001"), pdf("b.pdf"))
            .await;

        assert!(matches!(result, Err(QualityError::Conflict(_))));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_new_version_increments_revision() {
        let service = service();
        let actor = editor(&service).await;
        let record = service
            .create_document(&actor, document_input("3"), pdf("v0.pdf"))
            .await
            .unwrap();

        let version = service
            .add_version(&actor, record.doc_id, None, pdf("v1.docx"))
            .await
            .unwrap();
        assert_eq!(version.revision, 1);
        assert_eq!(version.status, DocumentStatus::Vigente);
        assert_eq!(version.description, "Actualización a Rev 1");

        let versions = service.list_versions(record.doc_id).await.unwrap();
        let live: Vec<_> = versions
            .iter()
            .filter(|v| v.status != DocumentStatus::Obsoleto)
            .collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, version.id);

        let refreshed = service.get_document(record.doc_id).await.unwrap();
        assert_eq!(refreshed.file_name, "v1.docx");
        assert_eq!(refreshed.revision, Some(1));
    }

    /// Yields before storing so concurrent uploads interleave
    struct YieldingBackend(MemoryBackend);

    #[async_trait::async_trait]
    impl StorageBackend for YieldingBackend {
        async fn put_object(&self, data: Vec<u8>, metadata: ObjectMetadata) -> StorageResult<ObjectMetadata> {
            tokio::task::yield_now().await;
            self.0.put_object(data, metadata).await
        }

        async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
            self.0.get_object(bucket, key).await
        }

        async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
            self.0.delete_object(bucket, key).await
        }

        async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
            self.0.exists(bucket, key).await
        }

        fn name(&self) -> &'static str {
            "yielding"
        }
    }

    #[tokio::test]
    async fn test_concurrent_versions_get_distinct_revisions() {
        let service = QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(Arc::new(YieldingBackend(MemoryBackend::new())), "http://localhost:8080"),
        );
        let actor = editor(&service).await;
        let record = service
            .create_document(&actor, document_input("5"), pdf("v0.pdf"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            service.add_version(&actor, record.doc_id, None, pdf("a.pdf")),
            service.add_version(&actor, record.doc_id, None, pdf("b.pdf")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.revision, b.revision);

        let mut revisions: Vec<i32> = service
            .list_versions(record.doc_id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.revision)
            .collect();
        revisions.sort_unstable();
        assert_eq!(revisions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_revision_is_bounded() {
        let backend = Arc::new(MemoryBackend::new());
        let service = QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(backend.clone(), "http://localhost:8080"),
        );
        let actor = editor(&service).await;

        let mut oversized = document_input("6");
        oversized.revision = Some(i32::MAX);
        let result = service.create_document(&actor, oversized, pdf("a.pdf")).await;
        assert!(matches!(result, Err(QualityError::Validation(_))));
        assert!(backend.is_empty().await);

        let mut last = document_input("7");
        last.revision = Some(crate::documents::MAX_REVISION);
        let record = service.create_document(&actor, last, pdf("b.pdf")).await.unwrap();
        let result = service
            .add_version(&actor, record.doc_id, None, pdf("c.pdf"))
            .await;
        assert!(matches!(result, Err(QualityError::Validation(_))));
        // The rejected upload is discarded
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_document_description_only_when_changed() {
        let service = service();
        let actor = editor(&service).await;
        let record = service
            .create_document(&actor, document_input("4"), pdf("a.pdf"))
            .await
            .unwrap();

        let updated = service
            .update_document(
                record.doc_id,
                DocumentUpdate {
                    title: "Control de registros".to_string(),
                    category: DocumentCategory::Registro,
                    process: String::new(),
                    description: Some("Nueva descripción".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Control de registros");
        assert_eq!(updated.category, DocumentCategory::Registro);
        assert_eq!(updated.description, "Nueva descripción");
        // code is fixed at creation
        assert_eq!(updated.code, "PG-004");
    }

    #[tokio::test]
    async fn test_version_status_workflow() {
        let service = service();
        let actor = editor(&service).await;
        let record = service
            .create_document(&actor, document_input("5"), pdf("a.pdf"))
            .await
            .unwrap();
        let version_id = record.version_id.unwrap();

        let skipped = service
            .change_version_status(version_id, DocumentStatus::Vigente)
            .await;
        assert!(matches!(skipped, Err(QualityError::Validation(_))));

        service
            .change_version_status(version_id, DocumentStatus::EnAprobacion)
            .await
            .unwrap();
        let approved = service
            .change_version_status(version_id, DocumentStatus::Vigente)
            .await
            .unwrap();
        assert_eq!(approved.status, DocumentStatus::Vigente);
    }

    #[tokio::test]
    async fn test_list_documents_filters() {
        let service = service();
        let actor = editor(&service).await;
        service
            .create_document(&actor, document_input("1"), pdf("a.pdf"))
            .await
            .unwrap();
        let mut manual = document_input("1");
        manual.category = DocumentCategory::Manual;
        manual.title = "Manual de Calidad".to_string();
        service.create_document(&actor, manual, pdf("m.pdf")).await.unwrap();

        let all = service.list_documents(&DocumentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let manuals = service
            .list_documents(&DocumentFilter {
                search: Some("manual".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(manuals.len(), 1);
        assert_eq!(manuals[0].code, "MA-001");
    }

    #[tokio::test]
    async fn test_delete_document_removes_files() {
        let backend = Arc::new(MemoryBackend::new());
        let service = QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(backend.clone(), "http://localhost:8080"),
        );
        let actor = editor(&service).await;
        let record = service
            .create_document(&actor, document_input("9"), pdf("a.pdf"))
            .await
            .unwrap();
        service
            .add_version(&actor, record.doc_id, Some("Rev 1".to_string()), pdf("b.pdf"))
            .await
            .unwrap();
        assert_eq!(backend.len().await, 2);

        service.delete_document(record.doc_id).await.unwrap();
        assert!(backend.is_empty().await);
        assert!(matches!(
            service.get_document(record.doc_id).await,
            Err(QualityError::NotFound(_))
        ));
    }

    async fn process(service: &QualityService, actor: &User, code: &str, name: &str) -> Process {
        service
            .create_process(
                actor,
                ProcessInput {
                    code: code.to_string(),
                    name: name.to_string(),
                    process_type: ProcessType::Operativo,
                    responsibles: "Jefe de planta".to_string(),
                    subprocesses: "Recepción, Almacén,".to_string(),
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_process() {
        let service = service();
        let actor = editor(&service).await;
        let created = process(&service, &actor, "OP-01", "Producción").await;

        assert_eq!(created.subprocesses, vec!["Recepción", "Almacén"]);
        assert_eq!(created.owner_id, Some(actor.id));

        let missing = service
            .create_process(
                &actor,
                ProcessInput {
                    code: String::new(),
                    name: "Sin código".to_string(),
                    process_type: ProcessType::Apoyo,
                    responsibles: String::new(),
                    subprocesses: String::new(),
                },
            )
            .await;
        match missing {
            Err(QualityError::Validation(message)) => {
                assert_eq!(message, "Nombre y Código son obligatorios")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_indicator_lifecycle() {
        let service = service();
        let actor = editor(&service).await;
        let owner = process(&service, &actor, "CO-01", "Comercial").await;

        let missing = service.create_indicator(IndicatorInput::default()).await;
        assert!(matches!(missing, Err(QualityError::Validation(_))));

        let created = service
            .create_indicator(IndicatorInput {
                name: "Satisfacción del cliente".to_string(),
                process_id: Some(owner.id),
                target_value: Some(90.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.process, "Comercial");
        assert_eq!(created.unit, "%");
        assert_eq!(created.frequency, Frequency::Trimestral);
        assert_eq!(created.current_value, 0.0);
        assert_eq!(created.status, IndicatorStatus::EnProceso);
        assert_eq!(created.period_start_date, Some(today()));

        let (updated, history) = service
            .record_measurement(
                created.id,
                MeasurementInput {
                    value_1: 45.0,
                    value_2: 50.0,
                    period: "2024-03".to_string(),
                    observations: String::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.current_value, 90.0);
        // period started today, nothing elapsed yet
        assert_eq!(updated.status, IndicatorStatus::EnProceso);
        assert_eq!(history.result, 90.0);
        assert_eq!(history.period_date.to_string(), "2024-03-01");

        assert_eq!(service.indicator_history(created.id).await.unwrap().len(), 1);
        assert_eq!(service.indicator_summary().await.unwrap().in_progress, 1);

        let pdf = service.indicator_report().await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        service.delete_indicator(created.id).await.unwrap();
        assert!(service.list_indicators().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_scope_and_progress() {
        let service = service();
        let actor = editor(&service).await;
        let compras = process(&service, &actor, "AP-01", "Compras").await;
        process(&service, &actor, "AP-02", "Ventas").await;

        let missing_title = service
            .create_audit(AuditInput {
                title: " ".to_string(),
                scheduled_date: None,
                auditor: String::new(),
                audit_type: AuditType::Interna,
                scope: vec![],
            })
            .await;
        match missing_title {
            Err(QualityError::Validation(message)) => {
                assert_eq!(message, "El título de la auditoría es obligatorio.")
            }
            other => panic!("unexpected result {:?}", other),
        }

        let audit = service
            .create_audit(AuditInput {
                title: "Auditoría interna 2024".to_string(),
                scheduled_date: None,
                auditor: "Laura".to_string(),
                audit_type: AuditType::Interna,
                scope: vec!["Compras".to_string(), "Desconocido".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(audit.status, AuditStatus::Programada);

        let detail = service.get_audit(audit.id).await.unwrap();
        assert_eq!(detail.process_ids, vec![compras.id]);

        let in_progress = service.update_audit_progress(audit.id, 40).await.unwrap();
        assert_eq!(in_progress.status, AuditStatus::EnCurso);
        let done = service.update_audit_progress(audit.id, 100).await.unwrap();
        assert_eq!(done.status, AuditStatus::Completada);
        assert!(service.update_audit_progress(audit.id, 120).await.is_err());

        let finding = service
            .create_finding(
                audit.id,
                FindingInput {
                    finding_type: FindingType::Mayor,
                    description: "Proveedor sin evaluación".to_string(),
                    process: "Compras".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(finding.status, FindingStatus::Abierta);
        assert_eq!(service.dashboard().await.unwrap().open_nonconformities, 1);

        service
            .update_finding_status(finding.id, FindingStatus::Cerrada)
            .await
            .unwrap();
        assert_eq!(service.dashboard().await.unwrap().open_nonconformities, 0);

        let stats = service.audit_stats().await.unwrap();
        assert_eq!((stats.total, stats.completed), (1, 1));
    }

    #[tokio::test]
    async fn test_user_management_rules() {
        let service = service();
        let admin = editor(&service).await;
        let reader = service
            .create_account(
                Credential {
                    auth_id: Uuid::new_v4(),
                    email: "lector@empresa.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                String::new(),
            )
            .await
            .unwrap();
        assert_eq!(reader.role, UserRole::Lector);

        assert!(matches!(
            service.change_role(&reader, admin.id, UserRole::Lector).await,
            Err(QualityError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_user(&admin, admin.id).await,
            Err(QualityError::Validation(_))
        ));

        let promoted = service.change_role(&admin, reader.id, UserRole::Editor).await.unwrap();
        assert_eq!(promoted.role, UserRole::Editor);
        assert_eq!(service.user_stats().await.unwrap().editors, 2);

        let profile = service.load_profile(reader.auth_id).await.unwrap().unwrap();
        assert!(profile.last_access.is_some());

        service.delete_user(&admin, reader.id).await.unwrap();
        assert!(service.load_profile(reader.auth_id).await.unwrap().is_none());
    }
}
