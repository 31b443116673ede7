use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use quality_service::{Indicator, IndicatorHistory, IndicatorInput, IndicatorSummary, MeasurementInput};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{api_list, api_success, ApiError, ApiResponse};
use crate::handlers::MessageResponse;
use crate::middleware::{AuthContext, EditorContext};
use crate::server::SgcServer;

/// Indicator after a measurement, with the history row written
#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementResponse {
    pub indicator: Indicator,
    pub history: IndicatorHistory,
}

#[utoipa::path(
    get,
    path = "/api/v1/indicators",
    responses(
        (status = 200, description = "Indicators", body = Vec<Indicator>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn list_indicators(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Indicator>>>, ApiError> {
    let indicators = server.service.list_indicators().await?;
    Ok(Json(api_list(indicators)))
}

#[utoipa::path(
    get,
    path = "/api/v1/indicators/summary",
    responses((status = 200, description = "Counts per status", body = IndicatorSummary)),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn indicator_summary(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<IndicatorSummary>>, ApiError> {
    let summary = server.service.indicator_summary().await?;
    Ok(Json(api_success(summary)))
}

/// Download every indicator as a PDF table
#[utoipa::path(
    get,
    path = "/api/v1/indicators/report.pdf",
    responses((status = 200, description = "PDF report", content_type = "application/pdf")),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn indicator_report(
    State(server): State<SgcServer>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    let pdf = server.service.indicator_report().await?;
    let file_name = format!(
        "informe-indicadores-{}.pdf",
        chrono::Local::now().date_naive().format("%Y-%m-%d")
    );
    tracing::info!(user_id = auth.user.id, bytes = pdf.len(), "Indicator report downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/indicators/{id}",
    params(("id" = i64, Path, description = "Indicator id")),
    responses(
        (status = 200, description = "Indicator", body = Indicator),
        (status = 404, description = "Indicador no encontrado")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn get_indicator(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Indicator>>, ApiError> {
    let indicator = server.service.get_indicator(id).await?;
    Ok(Json(api_success(indicator)))
}

#[utoipa::path(
    post,
    path = "/api/v1/indicators",
    request_body = IndicatorInput,
    responses(
        (status = 200, description = "Indicator created", body = Indicator),
        (status = 400, description = "Missing name or invalid values"),
        (status = 403, description = "Editor role required")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn create_indicator(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Json(input): Json<IndicatorInput>,
) -> Result<Json<ApiResponse<Indicator>>, ApiError> {
    let indicator = server.service.create_indicator(input).await?;
    Ok(Json(api_success(indicator)))
}

#[utoipa::path(
    put,
    path = "/api/v1/indicators/{id}",
    params(("id" = i64, Path, description = "Indicator id")),
    request_body = IndicatorInput,
    responses(
        (status = 200, description = "Indicator updated", body = Indicator),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Indicador no encontrado")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn update_indicator(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(input): Json<IndicatorInput>,
) -> Result<Json<ApiResponse<Indicator>>, ApiError> {
    let indicator = server.service.update_indicator(id, input).await?;
    Ok(Json(api_success(indicator)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/indicators/{id}",
    params(("id" = i64, Path, description = "Indicator id")),
    responses(
        (status = 200, description = "Indicator and history deleted", body = MessageResponse),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Indicador no encontrado")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn delete_indicator(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    server.service.delete_indicator(id).await?;
    Ok(Json(api_success(MessageResponse::new("Indicador eliminado"))))
}

/// Record A and B for a period and recompute the indicator
#[utoipa::path(
    post,
    path = "/api/v1/indicators/{id}/measurements",
    params(("id" = i64, Path, description = "Indicator id")),
    request_body = MeasurementInput,
    responses(
        (status = 200, description = "Measurement recorded", body = MeasurementResponse),
        (status = 400, description = "Invalid values or period"),
        (status = 403, description = "Editor role required"),
        (status = 404, description = "Indicador no encontrado")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn record_measurement(
    State(server): State<SgcServer>,
    _editor: EditorContext,
    Path(id): Path<i64>,
    Json(input): Json<MeasurementInput>,
) -> Result<Json<ApiResponse<MeasurementResponse>>, ApiError> {
    let (indicator, history) = server.service.record_measurement(id, input).await?;
    Ok(Json(api_success(MeasurementResponse { indicator, history })))
}

#[utoipa::path(
    get,
    path = "/api/v1/indicators/{id}/history",
    params(("id" = i64, Path, description = "Indicator id")),
    responses(
        (status = 200, description = "Measurements, newest period first", body = Vec<IndicatorHistory>),
        (status = 404, description = "Indicador no encontrado")
    ),
    tag = "indicators",
    security(("bearer_auth" = []))
)]
pub async fn indicator_history(
    State(server): State<SgcServer>,
    _auth: AuthContext,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<IndicatorHistory>>>, ApiError> {
    let history = server.service.indicator_history(id).await?;
    Ok(Json(api_list(history)))
}
