use super::rows::{convert_all, ProcessRow};
use super::{db_error, ensure_affected, query_error, PgQualityStore};
use async_trait::async_trait;
use quality_service::*;

const PROCESS_COLUMNS: &str =
    "id, code, name, process_type, responsibles, subprocesses, owner_id, created_at";

fn duplicate_code(code: &str) -> String {
    format!("Ya existe un proceso con el código {}", code)
}

#[async_trait]
impl ProcessStore for PgQualityStore {
    async fn list_processes(&self) -> QualityResult<Vec<Process>> {
        let rows = sqlx::query_as::<_, ProcessRow>(&format!(
            "SELECT {PROCESS_COLUMNS} FROM processes ORDER BY code"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_process(&self, id: i64) -> QualityResult<Option<Process>> {
        sqlx::query_as::<_, ProcessRow>(&format!(
            "SELECT {PROCESS_COLUMNS} FROM processes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(Process::try_from)
        .transpose()
    }

    async fn insert_process(&self, process: NewProcess) -> QualityResult<Process> {
        sqlx::query_as::<_, ProcessRow>(&format!(
            "INSERT INTO processes (code, name, process_type, responsibles, subprocesses, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PROCESS_COLUMNS}"
        ))
        .bind(&process.code)
        .bind(&process.name)
        .bind(process.process_type.as_str())
        .bind(&process.responsibles)
        .bind(&process.subprocesses)
        .bind(process.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| db_error(e, &duplicate_code(&process.code)))?
        .try_into()
    }

    async fn update_process(&self, id: i64, process: NewProcess) -> QualityResult<Process> {
        sqlx::query_as::<_, ProcessRow>(&format!(
            "UPDATE processes SET code = $2, name = $3, process_type = $4, responsibles = $5, \
             subprocesses = $6 WHERE id = $1 RETURNING {PROCESS_COLUMNS}"
        ))
        .bind(id)
        .bind(&process.code)
        .bind(&process.name)
        .bind(process.process_type.as_str())
        .bind(&process.responsibles)
        .bind(&process.subprocesses)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| db_error(e, &duplicate_code(&process.code)))?
        .ok_or_else(|| QualityError::not_found("Proceso no encontrado"))?
        .try_into()
    }

    async fn delete_process(&self, id: i64) -> QualityResult<()> {
        let result = sqlx::query("DELETE FROM processes WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Proceso no encontrado")
    }
}
