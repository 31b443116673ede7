use axum::{extract::State, Json};
use quality_service::users::initials;
use quality_service::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::Session;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::MessageResponse;
use crate::middleware::AuthContext;
use crate::server::SgcServer;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(email(message = "Email inválido"))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres"))]
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "El email es obligatorio"))]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria"))]
    pub password: String,
}

/// Profile as shown in the header avatar
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub initials: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        let initials = initials(&user.full_name, &user.email);
        Self { user, initials }
    }
}

/// Create an account; the first one becomes editor
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created", body = Session),
        (status = 400, description = "Invalid e-mail or password"),
        (status = 409, description = "E-mail already registered")
    ),
    tag = "authentication"
)]
pub async fn sign_up(
    State(server): State<SgcServer>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    request.validate()?;
    let session = server
        .auth
        .sign_up(&request.email, &request.password, request.full_name)
        .await?;
    Ok(Json(api_success(session)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = Session),
        (status = 401, description = "Email o contraseña incorrectos")
    ),
    tag = "authentication"
)]
pub async fn sign_in(
    State(server): State<SgcServer>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    request.validate()?;
    let session = server.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(api_success(session)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signout",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "authentication",
    security(("bearer_auth" = []))
)]
pub async fn sign_out(
    State(server): State<SgcServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.auth.sign_out(&auth.claims);
    Ok(Json(api_success(MessageResponse::new("Sesión cerrada"))))
}

/// Current profile; stamps the last access time
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "authentication",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(server): State<SgcServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = server
        .service
        .load_profile(auth.user.auth_id)
        .await?
        .ok_or_else(|| ApiError::authentication("Sesión inválida o expirada"))?;
    Ok(Json(api_success(user.into())))
}
