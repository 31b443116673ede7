use axum::{extract::State, Json};
use quality_service::reporting::Dashboard;

use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::SgcServer;

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Quality system overview", body = Dashboard),
        (status = 401, description = "Unauthorized")
    ),
    tag = "dashboard",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    State(server): State<SgcServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = server.service.dashboard().await?;
    Ok(Json(api_success(dashboard)))
}
