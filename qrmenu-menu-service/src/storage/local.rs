use std::path::PathBuf;

use tracing::debug;

use super::{validate_key, ObjectStorage, StorageError, UploadOptions};

/// Stores objects under `<root>/<bucket>/<key>` on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(&self.bucket).join(key)
    }
}

impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.object_path(key);
        if !options.upsert && tokio::fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), content_type = options.content_type, "stored object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}
