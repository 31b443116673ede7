use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use crate::{
    handlers::{audits, auth, dashboard, documents, files, health, indicators, processes, users},
    openapi,
    server::SgcServer,
};

/// Create health check routes
pub fn health_routes() -> Router<SgcServer> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/version", get(health::version_info))
}

/// Create authentication routes
pub fn auth_routes() -> Router<SgcServer> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
}

/// Create controlled document routes; uploads may use up to `max_upload_bytes`
pub fn document_routes(max_upload_bytes: usize) -> Router<SgcServer> {
    Router::new()
        .route(
            "/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/documents/categories", get(documents::category_counts))
        .route(
            "/documents/:id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/documents/:id/versions",
            get(documents::list_versions).post(documents::add_version),
        )
        .route(
            "/document-versions/:id/status",
            patch(documents::change_version_status),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Create indicator routes
pub fn indicator_routes() -> Router<SgcServer> {
    Router::new()
        .route(
            "/indicators",
            get(indicators::list_indicators).post(indicators::create_indicator),
        )
        .route("/indicators/summary", get(indicators::indicator_summary))
        .route("/indicators/report.pdf", get(indicators::indicator_report))
        .route(
            "/indicators/:id",
            get(indicators::get_indicator)
                .put(indicators::update_indicator)
                .delete(indicators::delete_indicator),
        )
        .route(
            "/indicators/:id/measurements",
            post(indicators::record_measurement),
        )
        .route("/indicators/:id/history", get(indicators::indicator_history))
}

/// Create process map routes
pub fn process_routes() -> Router<SgcServer> {
    Router::new()
        .route(
            "/processes",
            get(processes::list_processes).post(processes::create_process),
        )
        .route("/processes/map", get(processes::process_map))
        .route(
            "/processes/:id",
            get(processes::get_process)
                .put(processes::update_process)
                .delete(processes::delete_process),
        )
}

/// Create audit and finding routes
pub fn audit_routes() -> Router<SgcServer> {
    Router::new()
        .route("/audits", get(audits::list_audits).post(audits::create_audit))
        .route("/audits/stats", get(audits::audit_stats))
        .route(
            "/audits/:id",
            get(audits::get_audit).delete(audits::delete_audit),
        )
        .route("/audits/:id/progress", put(audits::update_progress))
        .route(
            "/audits/:id/findings",
            get(audits::list_findings).post(audits::create_finding),
        )
        .route(
            "/findings/:id",
            patch(audits::update_finding_status).delete(audits::delete_finding),
        )
}

/// Create user management routes
pub fn user_routes() -> Router<SgcServer> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/stats", get(users::user_stats))
        .route("/users/:id", axum::routing::delete(users::delete_user))
        .route("/users/:id/role", put(users::change_role))
}

/// API v1 routes; every handler except sign-up/sign-in extracts a session
pub fn api_v1_routes(max_upload_bytes: usize) -> Router<SgcServer> {
    Router::new()
        .merge(auth_routes())
        .merge(document_routes(max_upload_bytes))
        .merge(indicator_routes())
        .merge(process_routes())
        .merge(audit_routes())
        .merge(user_routes())
        .route("/dashboard", get(dashboard::dashboard))
}

/// Create all application routes
pub fn create_routes(max_upload_bytes: usize) -> Router<SgcServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        .merge(openapi::create_docs_routes())
        // Stored files are linked from the UI without a bearer token
        .route("/files/:bucket/:key", get(files::download_file))
        .nest("/api/v1", api_v1_routes(max_upload_bytes))
}
