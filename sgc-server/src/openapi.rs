use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::server::SgcServer;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        // Health endpoints
        handlers::health::health_check,
        handlers::health::version_info,

        // Authentication endpoints
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_out,
        handlers::auth::me,

        // Documents
        handlers::documents::list_documents,
        handlers::documents::category_counts,
        handlers::documents::get_document,
        handlers::documents::create_document,
        handlers::documents::update_document,
        handlers::documents::delete_document,
        handlers::documents::list_versions,
        handlers::documents::add_version,
        handlers::documents::change_version_status,

        // Indicators
        handlers::indicators::list_indicators,
        handlers::indicators::indicator_summary,
        handlers::indicators::indicator_report,
        handlers::indicators::get_indicator,
        handlers::indicators::create_indicator,
        handlers::indicators::update_indicator,
        handlers::indicators::delete_indicator,
        handlers::indicators::record_measurement,
        handlers::indicators::indicator_history,

        // Processes
        handlers::processes::list_processes,
        handlers::processes::process_map,
        handlers::processes::get_process,
        handlers::processes::create_process,
        handlers::processes::update_process,
        handlers::processes::delete_process,

        // Audits and findings
        handlers::audits::list_audits,
        handlers::audits::audit_stats,
        handlers::audits::get_audit,
        handlers::audits::create_audit,
        handlers::audits::update_progress,
        handlers::audits::delete_audit,
        handlers::audits::list_findings,
        handlers::audits::create_finding,
        handlers::audits::update_finding_status,
        handlers::audits::delete_finding,

        // Users
        handlers::users::list_users,
        handlers::users::user_stats,
        handlers::users::change_role,
        handlers::users::delete_user,

        handlers::dashboard::dashboard,
        handlers::files::download_file,
    ),
    components(
        schemas(
            crate::error::ApiErrorResponse,
            handlers::MessageResponse,
            handlers::UploadPayload,
            handlers::health::HealthResponse,
            handlers::health::VersionResponse,
            handlers::auth::SignUpRequest,
            handlers::auth::SignInRequest,
            handlers::auth::ProfileResponse,
            crate::auth::Session,
            crate::auth::tokens::IssuedToken,
            handlers::documents::CreateDocumentRequest,
            handlers::documents::NewVersionRequest,
            handlers::documents::StatusChangeRequest,
            handlers::indicators::MeasurementResponse,
            handlers::audits::ProgressRequest,
            handlers::audits::FindingStatusRequest,
            handlers::users::UserView,
            handlers::users::RoleRequest,

            // Domain types
            quality_service::DocumentCategory,
            quality_service::DocumentStatus,
            quality_service::DocumentRecord,
            quality_service::DocumentVersion,
            quality_service::DocumentInput,
            quality_service::DocumentUpdate,
            quality_service::DocumentFilter,
            quality_service::CategoryCount,
            quality_service::Frequency,
            quality_service::IndicatorStatus,
            quality_service::Trend,
            quality_service::Indicator,
            quality_service::IndicatorInput,
            quality_service::IndicatorHistory,
            quality_service::MeasurementInput,
            quality_service::IndicatorSummary,
            quality_service::ProcessType,
            quality_service::Process,
            quality_service::ProcessInput,
            quality_service::ProcessGroup,
            quality_service::AuditType,
            quality_service::AuditStatus,
            quality_service::Audit,
            quality_service::AuditInput,
            quality_service::AuditDetail,
            quality_service::AuditStats,
            quality_service::FindingType,
            quality_service::FindingStatus,
            quality_service::AuditFinding,
            quality_service::FindingInput,
            quality_service::FindingSummary,
            quality_service::UserRole,
            quality_service::User,
            quality_service::UserStats,
            quality_service::reporting::Dashboard,
            quality_service::reporting::IndicatorProgress,
        )
    ),
    tags(
        (name = "health", description = "Liveness and build information"),
        (name = "authentication", description = "Account creation and sessions"),
        (name = "documents", description = "Controlled documents and their revisions"),
        (name = "indicators", description = "Quality indicators and measurements"),
        (name = "processes", description = "Process map"),
        (name = "audits", description = "Audit programme and findings"),
        (name = "users", description = "Profiles and roles"),
        (name = "dashboard", description = "Quality system overview"),
        (name = "files", description = "Stored document files"),
    ),
    info(
        title = "SGC Engine API",
        version = "1.0.0",
        description = "ISO 9001 quality management system: documents, indicators, processes and audits."
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serve the generated OpenAPI document
pub fn create_docs_routes() -> Router<SgcServer> {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_api_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/documents"));
        assert!(paths.contains_key("/api/v1/indicators/{id}/measurements"));
        assert!(paths.contains_key("/files/{bucket}/{key}"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
