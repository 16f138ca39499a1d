use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub mod local;
pub mod supabase;

pub use local::LocalStorage;
pub use supabase::SupabaseStorage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: &'static str,
    /// Replace an existing object under the same key instead of failing.
    pub upsert: bool,
}

/// Blob storage addressed by key, with stable public URLs.
pub trait ObjectStorage {
    fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn public_url(&self, key: &str) -> String;
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid object key {0:?}")]
    InvalidKey(String),
    #[error("object {0} already exists")]
    AlreadyExists(String),
    #[error("filesystem error")]
    Io(#[from] std::io::Error),
    #[error("storage request failed")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),
}

/// Rejects empty keys, absolute keys and any `.`/`..` segment.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Storage backend chosen at startup.
#[derive(Clone, Debug)]
pub enum AnyStorage {
    Local(LocalStorage),
    Supabase(SupabaseStorage),
}

impl ObjectStorage for AnyStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<(), StorageError> {
        match self {
            AnyStorage::Local(storage) => storage.upload(key, bytes, options).await,
            AnyStorage::Supabase(storage) => storage.upload(key, bytes, options).await,
        }
    }

    fn public_url(&self, key: &str) -> String {
        match self {
            AnyStorage::Local(storage) => storage.public_url(key),
            AnyStorage::Supabase(storage) => storage.public_url(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("qr-codes/abc-1.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("qr-codes/../../secret").is_err());
        assert!(validate_key("qr-codes//a.png").is_err());
    }
}
