//! Process-local content store used for tests and local runs.

use super::{ContentStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Content store holding objects in memory.
#[derive(Default)]
pub struct InMemoryContentStore {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

#[derive(Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

impl InMemoryContentStore {
    /// Create an empty store reporting `bucket` as its name.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an object exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Content type recorded for `key`, if present.
    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.content_type.clone())
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        // Deleting a missing key succeeds, matching S3.
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_returns_bytes() {
        let store = InMemoryContentStore::new("bucket");
        store
            .put_object("doc.txt", b"hello".to_vec(), "text/plain")
            .await
            .expect("put");
        assert_eq!(store.get_object("doc.txt").await.expect("get"), b"hello");
        assert_eq!(store.content_type("doc.txt").await.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = InMemoryContentStore::new("bucket");
        let error = store.get_object("missing.json").await.unwrap_err();
        assert!(matches!(error, StorageError::NotFound(key) if key == "missing.json"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryContentStore::new("bucket");
        store
            .put_object("doc.json", b"{}".to_vec(), "application/json")
            .await
            .expect("put");
        store.delete_object("doc.json").await.expect("first delete");
        store.delete_object("doc.json").await.expect("second delete");
        assert!(store.is_empty().await);
    }
}
