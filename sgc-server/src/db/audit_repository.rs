use super::rows::{convert_all, AuditRow, FindingRow};
use super::{ensure_affected, query_error, PgQualityStore};
use async_trait::async_trait;
use quality_service::*;

const AUDIT_COLUMNS: &str =
    "id, title, scheduled_date, auditor, audit_type, scope, progress, status, created_at";

const FINDING_COLUMNS: &str = "id, audit_id, finding_type, description, process, status, created_at";

#[async_trait]
impl AuditStore for PgQualityStore {
    async fn list_audits(&self) -> QualityResult<Vec<Audit>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audits ORDER BY scheduled_date ASC NULLS FIRST, id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_audit(&self, id: i64) -> QualityResult<Option<Audit>> {
        sqlx::query_as::<_, AuditRow>(&format!("SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_error)?
            .map(Audit::try_from)
            .transpose()
    }

    async fn create_audit(&self, audit: NewAudit, process_ids: Vec<i64>) -> QualityResult<Audit> {
        let mut tx = self.pool().begin().await.map_err(query_error)?;

        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "INSERT INTO audits (title, scheduled_date, auditor, audit_type, scope, progress, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {AUDIT_COLUMNS}"
        ))
        .bind(&audit.title)
        .bind(audit.scheduled_date)
        .bind(&audit.auditor)
        .bind(audit.audit_type.as_str())
        .bind(&audit.scope)
        .bind(audit.progress)
        .bind(audit.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        if !process_ids.is_empty() {
            sqlx::query(
                "INSERT INTO audit_processes (audit_id, process_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            )
            .bind(row.id)
            .bind(&process_ids)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        row.try_into()
    }

    async fn audit_process_ids(&self, audit_id: i64) -> QualityResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT process_id FROM audit_processes WHERE audit_id = $1 ORDER BY process_id",
        )
        .bind(audit_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_error)
    }

    async fn update_audit_progress(
        &self,
        id: i64,
        progress: i32,
        status: AuditStatus,
    ) -> QualityResult<Audit> {
        sqlx::query_as::<_, AuditRow>(&format!(
            "UPDATE audits SET progress = $2, status = $3 WHERE id = $1 RETURNING {AUDIT_COLUMNS}"
        ))
        .bind(id)
        .bind(progress)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .ok_or_else(|| QualityError::not_found("Auditoría no encontrada"))?
        .try_into()
    }

    async fn delete_audit(&self, id: i64) -> QualityResult<()> {
        let result = sqlx::query("DELETE FROM audits WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Auditoría no encontrada")
    }

    async fn list_findings(&self, audit_id: i64) -> QualityResult<Vec<AuditFinding>> {
        let rows = sqlx::query_as::<_, FindingRow>(&format!(
            "SELECT {FINDING_COLUMNS} FROM audit_findings WHERE audit_id = $1 ORDER BY id"
        ))
        .bind(audit_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn list_all_findings(&self) -> QualityResult<Vec<AuditFinding>> {
        let rows = sqlx::query_as::<_, FindingRow>(&format!(
            "SELECT {FINDING_COLUMNS} FROM audit_findings ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn insert_finding(&self, finding: NewFinding) -> QualityResult<AuditFinding> {
        // The FK would reject a missing audit too, but with a less useful error
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM audits WHERE id = $1)")
            .bind(finding.audit_id)
            .fetch_one(self.pool())
            .await
            .map_err(query_error)?;
        if !exists {
            return Err(QualityError::not_found("Auditoría no encontrada"));
        }

        sqlx::query_as::<_, FindingRow>(&format!(
            "INSERT INTO audit_findings (audit_id, finding_type, description, process, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {FINDING_COLUMNS}"
        ))
        .bind(finding.audit_id)
        .bind(finding.finding_type.as_str())
        .bind(&finding.description)
        .bind(&finding.process)
        .bind(FindingStatus::Abierta.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(query_error)?
        .try_into()
    }

    async fn update_finding_status(&self, id: i64, status: FindingStatus) -> QualityResult<AuditFinding> {
        sqlx::query_as::<_, FindingRow>(&format!(
            "UPDATE audit_findings SET status = $2 WHERE id = $1 RETURNING {FINDING_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .ok_or_else(|| QualityError::not_found("Hallazgo no encontrado"))?
        .try_into()
    }

    async fn delete_finding(&self, id: i64) -> QualityResult<()> {
        let result = sqlx::query("DELETE FROM audit_findings WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Hallazgo no encontrado")
    }
}
