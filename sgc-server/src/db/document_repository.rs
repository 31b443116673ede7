use super::rows::{convert_all, DocumentRow, VersionRow};
use super::{db_error, ensure_affected, query_error, PgQualityStore};
use async_trait::async_trait;
use quality_service::*;

const DOCUMENT_COLUMNS: &str =
    "id, code, title, category, process, file_name, created_by, created_at";

const VERSION_COLUMNS: &str =
    "id, document_id, revision, file_url, status, description, uploaded_by, created_at";

#[async_trait]
impl DocumentStore for PgQualityStore {
    async fn list_documents(&self) -> QualityResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY code"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_document(&self, id: i64) -> QualityResult<Option<Document>> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(Document::try_from)
        .transpose()
    }

    async fn create_document(
        &self,
        document: NewDocument,
        version: NewDocumentVersion,
    ) -> QualityResult<(Document, DocumentVersion)> {
        let conflict = format!("Ya existe un documento con el código {}", document.code);
        let mut tx = self.pool().begin().await.map_err(query_error)?;

        let doc_row = sqlx::query_as::<_, DocumentRow>(&format!(
            "INSERT INTO documents (code, title, category, process, file_name, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(&document.code)
        .bind(&document.title)
        .bind(document.category.as_str())
        .bind(&document.process)
        .bind(&document.file_name)
        .bind(document.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error(e, &conflict))?;

        let version_row = sqlx::query_as::<_, VersionRow>(&format!(
            "INSERT INTO document_versions (document_id, revision, file_url, status, description, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VERSION_COLUMNS}"
        ))
        .bind(doc_row.id)
        .bind(version.revision)
        .bind(&version.file_url)
        .bind(version.status.as_str())
        .bind(&version.description)
        .bind(version.uploaded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok((doc_row.try_into()?, version_row.try_into()?))
    }

    async fn update_document(
        &self,
        id: i64,
        title: String,
        category: DocumentCategory,
        process: String,
    ) -> QualityResult<Document> {
        sqlx::query_as::<_, DocumentRow>(&format!(
            "UPDATE documents SET title = $2, category = $3, process = $4 \
             WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&title)
        .bind(category.as_str())
        .bind(&process)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .ok_or_else(|| QualityError::not_found("Documento no encontrado"))?
        .try_into()
    }

    async fn delete_document(&self, id: i64) -> QualityResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Documento no encontrado")
    }

    async fn list_versions(&self, document_id: i64) -> QualityResult<Vec<DocumentVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions \
             WHERE document_id = $1 ORDER BY revision DESC, id DESC"
        ))
        .bind(document_id)
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn list_all_versions(&self) -> QualityResult<Vec<DocumentVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_version(&self, id: i64) -> QualityResult<Option<DocumentVersion>> {
        sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {VERSION_COLUMNS} FROM document_versions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(DocumentVersion::try_from)
        .transpose()
    }

    async fn add_version(
        &self,
        document_id: i64,
        upload: NewRevision,
        file_name: String,
    ) -> QualityResult<DocumentVersion> {
        let mut tx = self.pool().begin().await.map_err(query_error)?;

        // Row lock on the master serializes concurrent uploads
        let updated = sqlx::query("UPDATE documents SET file_name = $2 WHERE id = $1")
            .bind(document_id)
            .bind(&file_name)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        ensure_affected(updated.rows_affected(), "Documento no encontrado")?;

        let latest = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(revision) FROM document_versions WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;
        let revision = documents::next_revision(latest)?;

        sqlx::query(
            "UPDATE document_versions SET status = $2 WHERE document_id = $1 AND status <> $2",
        )
        .bind(document_id)
        .bind(DocumentStatus::Obsoleto.as_str())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        let row = sqlx::query_as::<_, VersionRow>(&format!(
            "INSERT INTO document_versions (document_id, revision, file_url, status, description, uploaded_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VERSION_COLUMNS}"
        ))
        .bind(document_id)
        .bind(revision)
        .bind(&upload.file_url)
        .bind(DocumentStatus::Vigente.as_str())
        .bind(documents::version_description(upload.description, revision))
        .bind(upload.uploaded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        row.try_into()
    }

    async fn update_version_description(&self, id: i64, description: String) -> QualityResult<()> {
        let result = sqlx::query("UPDATE document_versions SET description = $2 WHERE id = $1")
            .bind(id)
            .bind(&description)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Versión no encontrada")
    }

    async fn update_version_status(&self, id: i64, status: DocumentStatus) -> QualityResult<DocumentVersion> {
        sqlx::query_as::<_, VersionRow>(&format!(
            "UPDATE document_versions SET status = $2 WHERE id = $1 RETURNING {VERSION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .ok_or_else(|| QualityError::not_found("Versión no encontrada"))?
        .try_into()
    }
}
