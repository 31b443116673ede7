//! Authentication: accounts, sign-in, tokens
//!
//! Credentials live next to the user profiles in the quality store. The
//! first account ever created becomes an editor, every later one a reader.

pub mod password;
pub mod tokens;

pub use password::PasswordService;
pub use tokens::{IssuedToken, JwtService, TokenClaims, TokenError};

use logger_redacted::{redacted_info, redacted_warn};
use quality_service::users::{validate_email, validate_password};
use quality_service::{Credential, QualityError, QualityService, User};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email o contraseña incorrectos")]
    InvalidCredentials,

    #[error("Sesión inválida o expirada")]
    InvalidSession,

    #[error(transparent)]
    Quality(#[from] QualityError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Profile plus the token to use with it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AuthService {
    service: QualityService,
    passwords: PasswordService,
    tokens: Arc<JwtService>,
}

/// Display name when none was given: the e-mail's local part
fn default_full_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

impl AuthService {
    pub fn new(service: QualityService, passwords: PasswordService, tokens: Arc<JwtService>) -> Self {
        Self {
            service,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &JwtService {
        &self.tokens
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<Session, AuthError> {
        let email = validate_email(email)?;
        validate_password(password)?;

        let full_name = full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_full_name(&email));

        let password_hash = self.passwords.hash_password(password).await?;
        let user = self
            .service
            .create_account(
                Credential {
                    auth_id: Uuid::new_v4(),
                    email,
                    password_hash,
                },
                full_name,
            )
            .await?;

        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let Some(credential) = self.service.find_credential(&email).await? else {
            redacted_warn!("Sign-in attempt for unknown account {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .passwords
            .verify_password(password, &credential.password_hash)
            .await?
        {
            redacted_warn!("Wrong password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .service
            .load_profile(credential.auth_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;
        let token = self.tokens.issue(&user)?;

        redacted_info!("User {} signed in", user.email);
        Ok(Session { user, token })
    }

    /// Resolve a bearer token to its claims and current profile
    pub async fn authenticate(&self, token: &str) -> Result<(TokenClaims, User), AuthError> {
        let claims = self.tokens.validate(token)?;
        let user = self
            .service
            .current_user(claims.auth_id()?)
            .await?
            .ok_or(AuthError::InvalidSession)?;
        Ok((claims, user))
    }

    pub fn sign_out(&self, claims: &TokenClaims) {
        self.tokens.revoke(claims);
        tracing::info!(jti = %claims.jti, "Token revoked on sign-out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_storage::{MemoryBackend, ObjectStore};
    use quality_service::{MemoryStore, UserRole};
    use secrecy::Secret;

    fn auth() -> AuthService {
        let service = QualityService::new(
            Arc::new(MemoryStore::new()),
            ObjectStore::new(Arc::new(MemoryBackend::new()), "http://localhost:8080"),
        );
        let tokens = JwtService::new(
            &Secret::new("test-secret-with-enough-length".to_string()),
            "sgc-engine",
            3600,
        );
        AuthService::new(service, PasswordService::new().unwrap(), Arc::new(tokens))
    }

    #[tokio::test]
    async fn test_first_account_is_editor() {
        let auth = auth();
        let first = auth.sign_up("Ana@Empresa.com", "secreto123", None).await.unwrap();
        let second = auth
            .sign_up("luis@empresa.com", "secreto123", Some("Luis Pérez".to_string()))
            .await
            .unwrap();

        assert_eq!(first.user.role, UserRole::Editor);
        assert_eq!(first.user.email, "ana@empresa.com");
        assert_eq!(first.user.full_name, "ana");
        assert_eq!(second.user.role, UserRole::Lector);
        assert_eq!(second.user.full_name, "Luis Pérez");
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let auth = auth();
        assert!(matches!(
            auth.sign_up("no-es-email", "secreto123", None).await,
            Err(AuthError::Quality(QualityError::Validation(_)))
        ));
        assert!(matches!(
            auth.sign_up("ana@empresa.com", "123", None).await,
            Err(AuthError::Quality(QualityError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let auth = auth();
        auth.sign_up("ana@empresa.com", "secreto123", None).await.unwrap();
        assert!(matches!(
            auth.sign_up("ana@empresa.com", "otraclave", None).await,
            Err(AuthError::Quality(QualityError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_and_authenticate() {
        let auth = auth();
        auth.sign_up("ana@empresa.com", "secreto123", None).await.unwrap();

        let session = auth.sign_in(" ANA@empresa.com ", "secreto123").await.unwrap();
        assert!(session.user.last_access.is_some());

        let (claims, user) = auth.authenticate(&session.token.access_token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        auth.sign_out(&claims);
        assert!(matches!(
            auth.authenticate(&session.token.access_token).await,
            Err(AuthError::Token(TokenError::Revoked))
        ));
    }

    #[tokio::test]
    async fn test_wrong_credentials_share_one_error() {
        let auth = auth();
        auth.sign_up("ana@empresa.com", "secreto123", None).await.unwrap();

        assert!(matches!(
            auth.sign_in("ana@empresa.com", "equivocada").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nadie@empresa.com", "secreto123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
