use crate::auth::{AuthError, TokenError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::error::DatabaseError;
use document_storage::StorageError;
use error_common::codes;
use quality_service::QualityError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type
    pub error_type: String,
    /// Stable error code (`VALIDATION_1001`, `AUTHZ_3002`, ...)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String, code: &'static str },

    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, Vec<String>>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            code: codes::authorization::ACCESS_DENIED,
        }
    }

    /// The caller is signed in but is a reader
    pub fn editor_required() -> Self {
        Self::Authorization {
            message: "Se requiere rol de editor para esta operación".to_string(),
            code: codes::authorization::EDITOR_REQUIRED,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database(db_err) => match db_err {
                DatabaseError::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(storage_err) => match storage_err {
                StorageError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
                StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Database(_) => "database_error",
            ApiError::Storage(_) => "storage_error",
            ApiError::Internal { .. } => "internal_error",
            ApiError::BadRequest { .. } => "bad_request",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => codes::validation::INVALID_INPUT,
            ApiError::BadRequest { .. } => codes::validation::INVALID_FORMAT,
            ApiError::Authentication { .. } => codes::authentication::INVALID_CREDENTIALS,
            ApiError::Authorization { code, .. } => *code,
            ApiError::NotFound { .. } => codes::resource::NOT_FOUND,
            ApiError::Conflict { .. } => codes::resource::CONFLICT,
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => {
                codes::database::CONNECTION_FAILED
            }
            ApiError::Database(_) => codes::database::QUERY_FAILED,
            ApiError::Storage(StorageError::ObjectNotFound { .. }) => {
                codes::storage::OBJECT_NOT_FOUND
            }
            ApiError::Storage(_) => codes::storage::UPLOAD_FAILED,
            ApiError::Internal { .. } => codes::internal::UNEXPECTED,
        }
    }

    /// Message shown to the user; internals stay in the logs
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::Authentication { message }
            | ApiError::Authorization { message, .. }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::BadRequest { message } => message.clone(),
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => {
                "No se pudo conectar con la base de datos. Inténtalo de nuevo.".to_string()
            }
            ApiError::Database(_) => "Error al acceder a los datos.".to_string(),
            ApiError::Storage(StorageError::ObjectNotFound { .. }) => {
                "Archivo no encontrado".to_string()
            }
            ApiError::Storage(StorageError::InvalidKey(_)) => "Ruta de archivo inválida".to_string(),
            ApiError::Storage(_) => "Error al guardar el archivo.".to_string(),
            ApiError::Internal { .. } => "Error interno del servidor.".to_string(),
        }
    }

    /// Get suggested actions for resolving the error
    pub fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ApiError::Validation { .. } => Some(vec![
                "Revisa los campos del formulario".to_string(),
                "Completa los campos obligatorios".to_string(),
            ]),
            ApiError::Authentication { .. } => Some(vec![
                "Vuelve a iniciar sesión".to_string(),
            ]),
            ApiError::Authorization { .. } => Some(vec![
                "Solicita el rol de editor a un administrador".to_string(),
            ]),
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => Some(vec![
                "Inténtalo de nuevo en unos momentos".to_string(),
            ]),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let field_errors = match &self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            _ => None,
        };

        let error_response = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            code: self.error_code().to_string(),
            message: self.user_message(),
            field_errors,
            timestamp: chrono::Utc::now(),
            suggestions: self.suggestions(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<QualityError> for ApiError {
    fn from(error: QualityError) -> Self {
        match error {
            QualityError::Validation(message) => ApiError::validation(message),
            QualityError::NotFound(message) => ApiError::not_found(message),
            QualityError::Conflict(message) => ApiError::conflict(message),
            QualityError::Forbidden(message) => ApiError::authorization(message),
            QualityError::Storage(e) => ApiError::Storage(e),
            QualityError::Database(message) => ApiError::Database(DatabaseError::QueryFailed(message)),
            QualityError::Report(message) => ApiError::internal(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials | AuthError::InvalidSession => {
                ApiError::authentication(error.to_string())
            }
            AuthError::Token(TokenError::Signing(message)) => ApiError::internal(message),
            AuthError::Token(_) => ApiError::authentication("Sesión inválida o expirada"),
            AuthError::Quality(e) => e.into(),
            AuthError::Internal(e) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors: HashMap<String, Vec<String>> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        let message = field_errors
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "Datos inválidos".to_string());
        ApiError::validation_with_fields(message, field_errors)
    }
}

/// Convert anyhow errors to API errors
impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal {
            message: error.to_string(),
        }
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: None,
    }
}

/// Successful list response carrying its row count
pub fn api_list<T>(data: Vec<T>) -> ApiResponse<Vec<T>> {
    let total_count = data.len();
    ApiResponse {
        success: true,
        data,
        metadata: Some(ResponseMetadata {
            total_count: Some(total_count),
        }),
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_errors_map_to_statuses() {
        let cases = [
            (QualityError::validation("x"), StatusCode::BAD_REQUEST),
            (QualityError::not_found("Documento no encontrado"), StatusCode::NOT_FOUND),
            (QualityError::Conflict("dup".to_string()), StatusCode::CONFLICT),
            (QualityError::Forbidden("no".to_string()), StatusCode::FORBIDDEN),
            (QualityError::Database("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = ApiError::from(QualityError::Database("relation \"users\" does not exist".to_string()));
        assert_eq!(err.user_message(), "Error al acceder a los datos.");

        let err = ApiError::validation("El título de la auditoría es obligatorio.");
        assert_eq!(err.user_message(), "El título de la auditoría es obligatorio.");
    }

    #[test]
    fn test_editor_required_code() {
        let err = ApiError::editor_required();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), codes::authorization::EDITOR_REQUIRED);
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).user_message(),
            "Email o contraseña incorrectos"
        );
        assert_eq!(
            ApiError::from(AuthError::Token(TokenError::Revoked)).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_api_list_counts_rows() {
        let response = api_list(vec![1, 2, 3]);
        assert!(response.success);
        assert_eq!(response.metadata.and_then(|m| m.total_count), Some(3));
    }
}
