//! Authentication context extraction
//!
//! Handlers take [`AuthContext`] to require a signed-in user and
//! [`EditorContext`] to additionally require the `editor` role.

use crate::auth::TokenClaims;
use crate::error::ApiError;
use crate::server::SgcServer;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use quality_service::User;

/// Signed-in user resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub claims: TokenClaims,
}

/// Signed-in user holding the `editor` role
#[derive(Debug, Clone)]
pub struct EditorContext(pub AuthContext);

impl EditorContext {
    pub fn user(&self) -> &User {
        &self.0.user
    }
}

/// Extract the bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Debes iniciar sesión"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::authentication("Cabecera Authorization inválida. Formato: Bearer <token>"))
}

#[async_trait]
impl FromRequestParts<SgcServer> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &SgcServer,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let (claims, user) = server.auth.authenticate(token).await?;
        Ok(AuthContext { user, claims })
    }
}

#[async_trait]
impl FromRequestParts<SgcServer> for EditorContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &SgcServer,
    ) -> Result<Self, Self::Rejection> {
        let context = AuthContext::from_request_parts(parts, server).await?;
        if !context.user.is_editor() {
            tracing::warn!(user_id = context.user.id, "Reader attempted a change");
            return Err(ApiError::editor_required());
        }
        Ok(EditorContext(context))
    }
}
