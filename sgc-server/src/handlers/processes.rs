use axum::{
    extract::{Path, State},
    Json,
};
use quality_service::{Process, ProcessGroup, ProcessInput};

use crate::error::{api_list, api_success, ApiError, ApiResponse};
use crate::handlers::MessageResponse;
use crate::middleware::{AuthContext, EditorContext};
use crate::server::SgcServer;

#[utoipa::path(
    get,
    path = "/api/v1/processes",
    responses(
        (status = 200, description = "Processes ordered by code", body = Vec<Process>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn list_processes(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Process>>>, ApiError> {
    let processes = server.service.list_processes().await?;
    Ok(Json(api_list(processes)))
}

/// Processes grouped into strategic, operative and support lanes
#[utoipa::path(
    get,
    path = "/api/v1/processes/map",
    responses((status = 200, description = "Process map", body = Vec<ProcessGroup>)),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn process_map(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<ProcessGroup>>>, ApiError> {
    let map = server.service.process_map().await?;
    Ok(Json(api_success(map)))
}

#[utoipa::path(
    get,
    path = "/api/v1/processes/{id}",
    params(("id" = i64, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process", body = Process),
        (status = 404, description = "Proceso no encontrado")
    ),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn get_process(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Process>>, ApiError> {
    let process = server.service.get_process(id).await?;
    Ok(Json(api_success(process)))
}

#[utoipa::path(
    post,
    path = "/api/v1/processes",
    request_body = ProcessInput,
    responses(
        (status = 200, description = "Process created", body = Process),
        (status = 400, description = "Missing code or name"),
        (status = 403, description = "Editor role required"),
        (status = 409, description = "Code already in use")
    ),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn create_process(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Json(input): Json<ProcessInput>,
) -> Result<Json<ApiResponse<Process>>, ApiError> {
    let process = server.service.create_process(editor.user(), input).await?;
    Ok(Json(api_success(process)))
}

#[utoipa::path(
    put,
    path = "/api/v1/processes/{id}",
    params(("id" = i64, Path, description = "Process id")),
    request_body = ProcessInput,
    responses(
        (status = 200, description = "Process updated", body = Process),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Proceso no encontrado")
    ),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn update_process(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(input): Json<ProcessInput>,
) -> Result<Json<ApiResponse<Process>>, ApiError> {
    let process = server.service.update_process(id, input).await?;
    Ok(Json(api_success(process)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/processes/{id}",
    params(("id" = i64, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process deleted", body = MessageResponse),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Proceso no encontrado")
    ),
    tag = "processes",
    security(("bearer_auth" = []))
)]
pub async fn delete_process(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_process(id).await?;
    Ok(Json(api_success(MessageResponse::new("Proceso eliminado"))))
}
