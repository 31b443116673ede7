use axum::{
    extract::{Path, Query, State},
    Json,
};
use quality_service::{
    CategoryCount, DocumentFilter, DocumentInput, DocumentRecord, DocumentStatus, DocumentUpdate,
    DocumentVersion,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{api_list, api_success, ApiError, ApiResponse};
use crate::handlers::{MessageResponse, UploadPayload};
use crate::middleware::{AuthContext, EditorContext};
use crate::server::SgcServer;

/// New document metadata plus its first file
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    #[serde(flatten)]
    pub document: DocumentInput,
    pub file: UploadPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewVersionRequest {
    pub description: Option<String>,
    pub file: UploadPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    pub status: DocumentStatus,
}

/// List documents with their current version
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(DocumentFilter),
    responses(
        (status = 200, description = "Documents", body = Vec<DocumentRecord>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<ApiResponse<Vec<DocumentRecord>>>, ApiError> {
    let documents = server.service.list_documents(&filter).await?;
    Ok(Json(api_list(documents)))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/categories",
    responses(
        (status = 200, description = "Document count per category", body = Vec<CategoryCount>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn category_counts(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<CategoryCount>>>, ApiError> {
    let counts = server.service.category_counts().await?;
    Ok(Json(api_success(counts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = DocumentRecord),
        (status = 404, description = "Documento no encontrado")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn get_document(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DocumentRecord>>, ApiError> {
    let document = server.service.get_document(id).await?;
    Ok(Json(api_success(document)))
}

/// Upload a document and register its first version
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = CreateDocumentRequest,
    responses(
        (status = 200, description = "Document created", body = DocumentRecord),
        (status = 400, description = "Missing title, file or malformed number"),
        (status = 403, description = "Editor role required"),
        (status = 409, description = "Code already in use")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn create_document(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<ApiResponse<DocumentRecord>>, ApiError> {
    let file = request.file.decode()?;
    let document = server
        .service
        .create_document(editor.user(), request.document, file)
        .await?;
    Ok(Json(api_success(document)))
}

#[utoipa::path(
    put,
    path = "/api/v1/documents/{id}",
    params(("id" = i64, Path, description = "Document id")),
    request_body = DocumentUpdate,
    responses(
        (status = 200, description = "Document updated", body = DocumentRecord),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Documento no encontrado")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn update_document(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<ApiResponse<DocumentRecord>>, ApiError> {
    let document = server.service.update_document(id, update).await?;
    Ok(Json(api_success(document)))
}

/// Delete a document, its versions and stored files
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponse),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Documento no encontrado")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_document(id).await?;
    Ok(Json(api_success(MessageResponse::new("Documento eliminado"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/versions",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Versions, newest revision first", body = Vec<DocumentVersion>),
        (status = 404, description = "Documento no encontrado")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn list_versions(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<DocumentVersion>>>, ApiError> {
    let versions = server.service.list_versions(id).await?;
    Ok(Json(api_list(versions)))
}

/// Publish a new revision; earlier versions become obsolete
#[utoipa::path(
    post,
    path = "/api/v1/documents/{id}/versions",
    params(("id" = i64, Path, description = "Document id")),
    request_body = NewVersionRequest,
    responses(
        (status = 200, description = "Version published", body = DocumentVersion),
        (status = 400, description = "Missing file"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Documento no encontrado")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn add_version(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Path(id): Path<i64>,
    Json(request): Json<NewVersionRequest>,
) -> Result<Json<ApiResponse<DocumentVersion>>, ApiError> {
    let file = request.file.decode()?;
    let version = server
        .service
        .add_version(editor.user(), id, request.description, file)
        .await?;
    Ok(Json(api_success(version)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/document-versions/{id}/status",
    params(("id" = i64, Path, description = "Version id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status changed", body = DocumentVersion),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Versión no encontrada")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn change_version_status(
    State(server): State<SgcServer>,
    editor: EditorContext,
    Path(id): Path<i64>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<ApiResponse<DocumentVersion>>, ApiError> {
    let version = server.service.change_version_status(id, request.status).await?;
    tracing::info!(version_id = id, user_id = editor.user().id, status = %version.status, "Version status changed via API");
    Ok(Json(api_success(version)))
}
