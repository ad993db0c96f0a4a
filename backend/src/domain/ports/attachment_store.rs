//! Port for attachment blob storage.
//!
//! Blobs live outside the relational database (filesystem or S3-compatible
//! object storage). The store only ever sees opaque keys; all metadata is
//! relational.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by attachment store adapters.
    pub enum AttachmentStoreError {
        /// The backing store rejected the operation.
        Io { message: String } =>
            "attachment store operation failed: {message}",
        /// No blob exists under the given key.
        NotFound { key: String } =>
            "attachment blob not found: {key}",
    }
}

/// Port for blob storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store a blob under `key`, replacing any previous content.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), AttachmentStoreError>;

    /// Read the blob stored under `key`.
    async fn read(&self, key: &str) -> Result<Vec<u8>, AttachmentStoreError>;

    /// Delete the blob under `key`; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AttachmentStoreError>;
}

/// In-memory store for tests and fixture wiring.
#[derive(Debug, Default)]
pub struct MemoryAttachmentStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryAttachmentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently held; a poisoned lock counts as empty.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), AttachmentStoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        blobs.insert(key.to_owned(), bytes);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, AttachmentStoreError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        blobs
            .get(key)
            .cloned()
            .ok_or_else(|| AttachmentStoreError::not_found(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AttachmentStoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        blobs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn memory_store_round_trips_blobs() {
        let store = MemoryAttachmentStore::new();
        store.put("a/b", vec![1, 2, 3]).await.expect("put");
        assert_eq!(store.read("a/b").await.expect("read"), vec![1, 2, 3]);

        store.delete("a/b").await.expect("delete");
        assert!(matches!(
            store.read("a/b").await,
            Err(AttachmentStoreError::NotFound { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_a_missing_key_is_not_an_error() {
        let store = MemoryAttachmentStore::new();
        store.delete("missing").await.expect("delete");
        assert!(store.is_empty());
    }
}
