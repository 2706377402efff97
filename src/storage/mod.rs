//! Storage gateway: whole-object reads and writes against the content bucket.
//!
//! Objects are keyed `{documentId}.{extension}`. The gateway performs no retries; every
//! transport or not-found failure is handed back to the caller as a [`StorageError`].

mod memory;
mod s3;

pub use memory::InMemoryContentStore;
pub use s3::S3ContentStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by content store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists under the requested key.
    #[error("Object not found: {0}")]
    NotFound(String),
    /// Backend rejected the request or was unreachable.
    #[error("Storage request for '{key}' failed: {message}")]
    Backend {
        /// Object key the request targeted.
        key: String,
        /// Diagnostic message reported by the backend.
        message: String,
    },
}

/// Whole-object access to the content bucket.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of the bucket this store reads from and writes to.
    fn bucket(&self) -> &str;

    /// Write `data` under `key`, replacing any existing object.
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Read the full object stored under `key`.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove the object stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
}

/// Build the object key for a document.
pub fn object_key(document_id: &str, extension: &str) -> String {
    format!("{document_id}.{extension}")
}

/// Split an object key into its document id and lowercased extension.
///
/// Returns `None` for keys without an extension or with an empty id.
pub fn split_object_key(key: &str) -> Option<(&str, String)> {
    let (stem, extension) = key.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some((stem, extension.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_joins_id_and_extension() {
        assert_eq!(object_key("abc-123", "pdf"), "abc-123.pdf");
    }

    #[test]
    fn split_object_key_strips_extension() {
        assert_eq!(
            split_object_key("abc-123.JSON"),
            Some(("abc-123", "json".to_string()))
        );
        assert_eq!(
            split_object_key("a.b.txt"),
            Some(("a.b", "txt".to_string()))
        );
    }

    #[test]
    fn split_object_key_rejects_bare_names() {
        assert_eq!(split_object_key("no-extension"), None);
        assert_eq!(split_object_key(".txt"), None);
        assert_eq!(split_object_key("trailing."), None);
    }
}
