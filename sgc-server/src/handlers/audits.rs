use axum::{
    extract::{Path, State},
    Json,
};
use quality_service::{Audit, AuditDetail, AuditFinding, AuditInput, AuditStats, FindingInput, FindingStatus};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{api_list, api_success, ApiError, ApiResponse};
use crate::handlers::MessageResponse;
use crate::middleware::{AuthContext, EditorContext};
use crate::server::SgcServer;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressRequest {
    /// Completion percentage, 0 to 100
    pub progress: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FindingStatusRequest {
    pub status: FindingStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/audits",
    responses(
        (status = 200, description = "Audits by scheduled date", body = Vec<Audit>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn list_audits(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Audit>>>, ApiError> {
    let audits = server.service.list_audits().await?;
    Ok(Json(api_list(audits)))
}

#[utoipa::path(
    get,
    path = "/api/v1/audits/stats",
    responses((status = 200, description = "Audit counts per status", body = AuditStats)),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn audit_stats(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<AuditStats>>, ApiError> {
    let stats = server.service.audit_stats().await?;
    Ok(Json(api_success(stats)))
}

/// Audit with linked processes and findings
#[utoipa::path(
    get,
    path = "/api/v1/audits/{id}",
    params(("id" = i64, Path, description = "Audit id")),
    responses(
        (status = 200, description = "Audit detail", body = AuditDetail),
        (status = 404, description = "Auditoría no encontrada")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn get_audit(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AuditDetail>>, ApiError> {
    let detail = server.service.get_audit(id).await?;
    Ok(Json(api_success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/audits",
    request_body = AuditInput,
    responses(
        (status = 200, description = "Audit scheduled", body = Audit),
        (status = 400, description = "Missing title"),
        (status = 403, description = "Editor role required")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn create_audit(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Json(input): Json<AuditInput>,
) -> Result<Json<ApiResponse<Audit>>, ApiError> {
    let audit = server.service.create_audit(input).await?;
    Ok(Json(api_success(audit)))
}

/// Set progress; status follows from it
#[utoipa::path(
    put,
    path = "/api/v1/audits/{id}/progress",
    params(("id" = i64, Path, description = "Audit id")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = Audit),
        (status = 400, description = "Progress outside 0..=100"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Auditoría no encontrada")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn update_progress(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<ApiResponse<Audit>>, ApiError> {
    let audit = server.service.update_audit_progress(id, request.progress).await?;
    Ok(Json(api_success(audit)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/audits/{id}",
    params(("id" = i64, Path, description = "Audit id")),
    responses(
        (status = 200, description = "Audit deleted with its findings", body = MessageResponse),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Auditoría no encontrada")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn delete_audit(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_audit(id).await?;
    Ok(Json(api_success(MessageResponse::new("Auditoría eliminada"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/audits/{id}/findings",
    params(("id" = i64, Path, description = "Audit id")),
    responses(
        (status = 200, description = "Findings of the audit", body = Vec<AuditFinding>),
        (status = 404, description = "Auditoría no encontrada")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn list_findings(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AuditFinding>>>, ApiError> {
    let findings = server.service.list_findings(id).await?;
    Ok(Json(api_list(findings)))
}

#[utoipa::path(
    post,
    path = "/api/v1/audits/{id}/findings",
    params(("id" = i64, Path, description = "Audit id")),
    request_body = FindingInput,
    responses(
        (status = 200, description = "Finding registered as open", body = AuditFinding),
        (status = 400, description = "Missing description"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Auditoría no encontrada")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn create_finding(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(input): Json<FindingInput>,
) -> Result<Json<ApiResponse<AuditFinding>>, ApiError> {
    let finding = server.service.create_finding(id, input).await?;
    Ok(Json(api_success(finding)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/findings/{id}",
    params(("id" = i64, Path, description = "Finding id")),
    request_body = FindingStatusRequest,
    responses(
        (status = 200, description = "Finding status changed", body = AuditFinding),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Hallazgo no encontrado")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn update_finding_status(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(request): Json<FindingStatusRequest>,
) -> Result<Json<ApiResponse<AuditFinding>>, ApiError> {
    let finding = server.service.update_finding_status(id, request.status).await?;
    Ok(Json(api_success(finding)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/findings/{id}",
    params(("id" = i64, Path, description = "Finding id")),
    responses(
        (status = 200, description = "Finding deleted", body = MessageResponse),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Hallazgo no encontrado")
    ),
    tag = "audits",
    security(("bearer_auth" = []))
)]
pub async fn delete_finding(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_finding(id).await?;
    Ok(Json(api_success(MessageResponse::new("Hallazgo eliminado"))))
}
