use crate::error::{StorageError, StorageResult};
use crate::storage::{validate_segment, ObjectMetadata, StorageBackend, StoredObject};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// File system storage backend
///
/// Layout: `{base_path}/{bucket}/{key}` for the bytes and
/// `{base_path}/{bucket}/{key}.meta.json` for the metadata.
pub struct FileSystemBackend {
    base_path: PathBuf,
}

impl FileSystemBackend {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Create the base directory
    pub async fn initialize(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        info!(path = %self.base_path.display(), "File system storage initialized");
        Ok(())
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        validate_segment(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_segment(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        validate_segment(key)?;
        Ok(self.bucket_path(bucket)?.join(format!("{}.meta.json", key)))
    }

    fn not_found(bucket: &str, key: &str) -> StorageError {
        StorageError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl StorageBackend for FileSystemBackend {
    async fn put_object(&self, data: Vec<u8>, metadata: ObjectMetadata) -> StorageResult<ObjectMetadata> {
        fs::create_dir_all(self.bucket_path(&metadata.bucket)?).await?;

        let object_path = self.object_path(&metadata.bucket, &metadata.key)?;
        let mut file = fs::File::create(&object_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let metadata_json = serde_json::to_string_pretty(&metadata)?;
        fs::write(self.metadata_path(&metadata.bucket, &metadata.key)?, metadata_json).await?;

        Ok(metadata)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<StoredObject> {
        let object_path = self.object_path(bucket, key)?;
        let data = match fs::read(&object_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Self::not_found(bucket, key))
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = match fs::read_to_string(self.metadata_path(bucket, key)?).await {
            Ok(content) => serde_json::from_str(&content)?,
            // Objects copied in by hand have no sidecar
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ObjectMetadata::new(bucket, key, &data, crate::storage::content_type_for(key))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(StoredObject { data, metadata })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let object_path = self.object_path(bucket, key)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Self::not_found(bucket, key))
            }
            Err(e) => return Err(e.into()),
        }

        let metadata_path = self.metadata_path(bucket, key)?;
        if fs::try_exists(&metadata_path).await? {
            fs::remove_file(&metadata_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(fs::try_exists(self.object_path(bucket, key)?).await?)
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
