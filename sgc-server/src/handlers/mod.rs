pub mod audits;
pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod files;
pub mod health;
pub mod indicators;
pub mod processes;
pub mod users;

use crate::error::{ApiError, ApiResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use quality_service::FileUpload;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// File sent inside a JSON body
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadPayload {
    /// Original file name; its extension is kept
    pub file_name: String,
    /// File bytes, base64 encoded; a `data:` URL prefix is accepted
    pub content_base64: String,
    /// MIME type reported by the browser; the stored type follows the extension
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadPayload {
    pub fn decode(self) -> ApiResult<FileUpload> {
        let file_name = self.file_name.trim().to_string();
        if file_name.is_empty() {
            return Err(ApiError::validation("El nombre del archivo es obligatorio"));
        }

        let encoded = match self.content_base64.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => self.content_base64.as_str(),
        };
        let data = BASE64
            .decode(encoded.trim())
            .map_err(|_| ApiError::validation("El contenido del archivo no es base64 válido"))?;

        if let Some(content_type) = &self.content_type {
            tracing::debug!(file_name = %file_name, content_type = %content_type, size = data.len(), "Upload decoded");
        }
        Ok(FileUpload { file_name, data })
    }
}

/// Body of responses that only confirm an action
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(file_name: &str, content: &str) -> UploadPayload {
        UploadPayload {
            file_name: file_name.to_string(),
            content_base64: content.to_string(),
            content_type: None,
        }
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        let plain = payload("manual.pdf", "JVBERi0xLjQ=").decode().unwrap();
        assert_eq!(plain.data, b"%PDF-1.4");

        let data_url = payload("manual.pdf", "data:application/pdf;base64,JVBERi0xLjQ=")
            .decode()
            .unwrap();
        assert_eq!(data_url.data, b"%PDF-1.4");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(payload("", "JVBERi0xLjQ=").decode().is_err());
        assert!(payload("manual.pdf", "no es base64!").decode().is_err());
    }
}
