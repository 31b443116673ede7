use axum::{
    extract::{Path, State},
    Json,
};
use quality_service::users::initials;
use quality_service::{User, UserRole, UserStats};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{api_list, api_success, ApiError, ApiResponse};
use crate::handlers::MessageResponse;
use crate::middleware::{AuthContext, EditorContext};
use crate::server::SgcServer;

/// User row as listed on the users page
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub initials: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        let initials = initials(&user.full_name, &user.email);
        Self { user, initials }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleRequest {
    pub role: UserRole,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users by creation date", body = Vec<UserView>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<UserView>>>, ApiError> {
    let users = server.service.list_users().await?;
    Ok(Json(api_list(users.into_iter().map(UserView::from).collect())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/stats",
    responses((status = 200, description = "User counts per role", body = UserStats)),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn user_stats(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<UserStats>>, ApiError> {
    let stats = server.service.user_stats().await?;
    Ok(Json(api_success(stats)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    params(("id" = i64, Path, description = "User id")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserView),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Usuario no encontrado")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Path(id): Path<i64>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = server.service.change_role(editor.user(), id, request.role).await?;
    Ok(Json(api_success(user.into())))
}

/// Delete a profile and its login; editors cannot delete themselves
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "No puedes eliminar tu propio usuario"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Usuario no encontrado")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_user(editor.user(), id).await?;
    Ok(Json(api_success(MessageResponse::new("Usuario eliminado"))))
}
