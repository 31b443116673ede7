use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Bucket holding uploaded quality documents
pub const DOCUMENTS_BUCKET: &str = "documents";

/// Metadata kept alongside every stored object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectMetadata {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub etag: String,
    pub created_at: DateTime<Utc>,
}

impl ObjectMetadata {
    pub fn new(bucket: &str, key: &str, data: &[u8], content_type: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let etag = digest
            .iter()
            .take(16)
            .map(|b| format!("{:02x}", b))
            .collect::<String>();

        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            etag,
            created_at: Utc::now(),
        }
    }
}

/// Object bytes plus metadata
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub metadata: ObjectMetadata,
}

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store an object, replacing any previous content under the same key
    async fn put_object(&self, data: Vec<u8>, metadata: ObjectMetadata) -> StorageResult<ObjectMetadata>;

    /// Read an object
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject>;

    /// Remove an object
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Whether the object exists
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Backend name for logs and health output
    fn name(&self) -> &'static str;
}

/// Result of an upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub public_url: String,
    pub size: u64,
    pub content_type: String,
}

/// Facade over a backend that names objects and builds public URLs
#[derive(Clone)]
pub struct ObjectStore {
    backend: Arc<dyn StorageBackend>,
    public_base_url: String,
}

impl ObjectStore {
    pub fn new(backend: Arc<dyn StorageBackend>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            backend,
            public_base_url,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Upload a file under a fresh `{uuid}.{ext}` key
    pub async fn upload(
        &self,
        bucket: &str,
        original_name: &str,
        data: Vec<u8>,
    ) -> StorageResult<UploadedObject> {
        validate_segment(bucket)?;
        let key = object_key_for(original_name);
        let content_type = content_type_for(original_name);
        let metadata = ObjectMetadata::new(bucket, &key, &data, content_type);

        let stored = self.backend.put_object(data, metadata).await?;

        info!(
            bucket = bucket,
            key = %stored.key,
            size = stored.size,
            backend = self.backend.name(),
            "Object uploaded"
        );

        Ok(UploadedObject {
            public_url: self.public_url(bucket, &stored.key),
            bucket: stored.bucket,
            key: stored.key,
            size: stored.size,
            content_type: stored.content_type,
        })
    }

    pub async fn download(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        self.backend.get_object(bucket, key).await
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        debug!(bucket = bucket, key = key, "Deleting object");
        self.backend.delete_object(bucket, key).await
    }

    /// Public URL served by the API for an object
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/files/{}/{}", self.public_base_url, bucket, key)
    }

    /// Inverse of [`ObjectStore::public_url`]
    pub fn locate(&self, public_url: &str) -> Option<(String, String)> {
        let rest = public_url
            .strip_prefix(&self.public_base_url)?
            .strip_prefix("/files/")?;
        let (bucket, key) = rest.split_once('/')?;
        if validate_segment(bucket).is_err() || validate_segment(key).is_err() {
            return None;
        }
        Some((bucket.to_string(), key.to_string()))
    }
}

/// Fresh object key that keeps the original extension
pub fn object_key_for(original_name: &str) -> String {
    match extension_of(original_name) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type from the file extension
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Bucket names and keys are single path segments
pub(crate) fn validate_segment(segment: &str) -> StorageResult<()> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.ends_with(".meta.json")
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(segment.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;

    fn store() -> ObjectStore {
        ObjectStore::new(Arc::new(MemoryBackend::new()), "http://localhost:8080/")
    }

    #[test]
    fn test_object_key_keeps_extension() {
        let key = object_key_for("Procedimiento de Auditorías.DOCX");
        assert!(key.ends_with(".docx"));
        assert_eq!(key.len(), 36 + ".docx".len());
    }

    #[test]
    fn test_object_key_without_extension() {
        let key = object_key_for("LEEME");
        assert!(Uuid::parse_str(&key).is_ok());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("manual.pdf"), "application/pdf");
        assert_eq!(content_type_for("foto.JPG"), "image/jpeg");
        assert_eq!(content_type_for("archivo"), "application/octet-stream");
    }

    #[test]
    fn test_validate_segment_rejects_traversal() {
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("").is_err());
        assert!(validate_segment("x.meta.json").is_err());
        assert!(validate_segment("4f1c.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_upload_and_locate() {
        let store = store();
        let uploaded = store
            .upload(DOCUMENTS_BUCKET, "manual.pdf", b"%PDF-1.5".to_vec())
            .await
            .unwrap();

        assert_eq!(uploaded.content_type, "application/pdf");
        assert!(uploaded
            .public_url
            .starts_with("http://localhost:8080/files/documents/"));

        let (bucket, key) = store.locate(&uploaded.public_url).unwrap();
        assert_eq!(bucket, DOCUMENTS_BUCKET);
        assert_eq!(key, uploaded.key);

        let object = store.download(&bucket, &key).await.unwrap();
        assert_eq!(object.data, b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_locate_rejects_foreign_urls() {
        let store = store();
        assert!(store.locate("https://example.com/files/documents/a.pdf").is_none());
        assert!(store.locate("http://localhost:8080/files/documents").is_none());
    }
}
