use crate::error::{StorageError, StorageResult};
use crate::storage::{ObjectMetadata, StorageBackend, StoredObject};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process storage backend
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all buckets
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put_object(&self, data: Vec<u8>, metadata: ObjectMetadata) -> StorageResult<ObjectMetadata> {
        let id = (metadata.bucket.clone(), metadata.key.clone());
        let stored = StoredObject {
            data,
            metadata: metadata.clone(),
        };
        self.objects.write().await.insert(id, stored);
        Ok(metadata)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self
            .objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), key.to_string())))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let backend = MemoryBackend::new();
        let metadata = ObjectMetadata::new("documents", "a.pdf", b"abc", "application/pdf");
        backend.put_object(b"abc".to_vec(), metadata).await.unwrap();

        assert!(backend.exists("documents", "a.pdf").await.unwrap());
        assert_eq!(backend.get_object("documents", "a.pdf").await.unwrap().data, b"abc");

        backend.delete_object("documents", "a.pdf").await.unwrap();
        assert!(backend.is_empty().await);
        assert!(matches!(
            backend.get_object("documents", "a.pdf").await,
            Err(StorageError::ObjectNotFound { .. })
        ));
    }
}
