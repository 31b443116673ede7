pub mod auth_context;

pub use auth_context::{AuthContext, EditorContext};

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use logger_redacted::redact;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = elapsed.as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("X-Real-IP"))
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| redact(ip.trim()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Audit logging middleware; mutations are logged at info, reads at debug
pub async fn audit_logging_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let authenticated = headers.contains_key(header::AUTHORIZATION);
    let client_ip = client_ip(&headers);

    let response = next.run(request).await;
    let status = response.status().as_u16();

    if method == Method::GET || method == Method::OPTIONS || method == Method::HEAD {
        tracing::debug!(
            method = %method,
            uri = %uri,
            authenticated,
            client_ip = %client_ip,
            status,
            "Audit log: read"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            authenticated,
            client_ip = %client_ip,
            status,
            timestamp = %chrono::Utc::now().to_rfc3339(),
            "Audit log: change request"
        );
    }

    response
}

/// Create CORS layer for the configured browser origins
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("10.1.2.3, 172.16.0.1"));
        let ip = client_ip(&headers);
        assert!(!ip.contains("172.16.0.1"));
        assert_ne!(ip, "10.1.2.3");
    }

    #[test]
    fn test_client_ip_defaults_to_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
