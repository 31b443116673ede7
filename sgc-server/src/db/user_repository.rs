use super::rows::{convert_all, CredentialRow, UserRow};
use super::{db_error, ensure_affected, query_error, PgQualityStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quality_service::*;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, auth_id, email, full_name, role, last_access, created_at";

const DUPLICATE_EMAIL: &str = "Ya existe una cuenta con ese email";

#[async_trait]
impl UserStore for PgQualityStore {
    async fn create_account(&self, credential: Credential, full_name: String) -> QualityResult<User> {
        let mut tx = self.pool().begin().await.map_err(query_error)?;

        // Two concurrent first sign-ups must not both become editors
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        sqlx::query("INSERT INTO auth_credentials (auth_id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(credential.auth_id)
            .bind(&credential.email)
            .bind(&credential.password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, DUPLICATE_EMAIL))?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
        let role = if existing == 0 {
            UserRole::Editor
        } else {
            UserRole::Lector
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (auth_id, email, full_name, role) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(credential.auth_id)
        .bind(&credential.email)
        .bind(&full_name)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error(e, DUPLICATE_EMAIL))?;

        tx.commit().await.map_err(query_error)?;
        row.try_into()
    }

    async fn find_credential(&self, email: &str) -> QualityResult<Option<Credential>> {
        Ok(sqlx::query_as::<_, CredentialRow>(
            "SELECT auth_id, email, password_hash FROM auth_credentials WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(Credential::from))
    }

    async fn find_user_by_auth_id(&self, auth_id: Uuid) -> QualityResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE auth_id = $1"))
            .bind(auth_id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn touch_last_access(&self, auth_id: Uuid, at: DateTime<Utc>) -> QualityResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET last_access = $2 WHERE auth_id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(auth_id)
        .bind(at)
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self) -> QualityResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(query_error)?;
        convert_all(rows)
    }

    async fn get_user(&self, id: i64) -> QualityResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(query_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn update_role(&self, id: i64, role: UserRole) -> QualityResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(query_error)?
        .ok_or_else(|| QualityError::not_found("Usuario no encontrado"))?
        .try_into()
    }

    async fn delete_user(&self, id: i64) -> QualityResult<()> {
        // The profile goes with its credential through ON DELETE CASCADE
        let result = sqlx::query(
            "DELETE FROM auth_credentials WHERE auth_id = (SELECT auth_id FROM users WHERE id = $1)",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(query_error)?;
        ensure_affected(result.rows_affected(), "Usuario no encontrado")
    }
}
