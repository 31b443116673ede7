use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::server::SgcServer;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: u64,
    pub checks: HashMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub store: String,
    pub storage: String,
    pub features: Vec<String>,
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(server): State<SgcServer>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HashMap::new();

    let store = server.service.store();
    let store_healthy = store.is_healthy().await;
    checks.insert(
        store.backend_name().to_string(),
        if store_healthy { "healthy" } else { "unreachable" }.to_string(),
    );
    checks.insert(
        format!("storage:{}", server.service.objects().backend_name()),
        "healthy".to_string(),
    );
    checks.insert(
        "revoked_tokens".to_string(),
        server.auth.tokens().revoked_count().to_string(),
    );

    let (status_code, status) = if store_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime_secs(),
        checks,
    };

    (status_code, Json(response))
}

/// Version information handler
#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Build information", body = VersionResponse)),
    tag = "health"
)]
pub async fn version_info(State(server): State<SgcServer>) -> Json<VersionResponse> {
    let features = vec![
        "documents".to_string(),
        "indicators".to_string(),
        "processes".to_string(),
        "audits".to_string(),
        "pdf-reports".to_string(),
    ];

    Json(VersionResponse {
        name: "SGC Engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: server.service.store().backend_name().to_string(),
        storage: server.service.objects().backend_name().to_string(),
        features,
    })
}
