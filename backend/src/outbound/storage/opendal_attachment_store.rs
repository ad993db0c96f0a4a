//! Object-storage adapter for attachment blobs built on OpenDAL.
//!
//! Supports a local filesystem root for development and S3-compatible
//! object storage for deployments; the rest of the system only sees the
//! `AttachmentStore` port.

use async_trait::async_trait;
use opendal::{ErrorKind, Operator};

use crate::domain::ports::{AttachmentStore, AttachmentStoreError};

/// OpenDAL-backed implementation of the `AttachmentStore` port.
#[derive(Clone)]
pub struct OpendalAttachmentStore {
    op: Operator,
}

/// Credentials and location for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    /// Bucket name.
    pub bucket: String,
    /// Region identifier.
    pub region: String,
    /// Optional custom endpoint (MinIO etc.).
    pub endpoint: Option<String>,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl OpendalAttachmentStore {
    /// Open a store rooted at a local directory.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::Io`] when the operator cannot be
    /// built (e.g. the root is not creatable).
    pub fn new_fs(root: &str) -> Result<Self, AttachmentStoreError> {
        let mut builder = opendal::services::Fs::default();
        builder.root(root);
        let op = Operator::new(builder)
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?
            .finish();
        Ok(Self { op })
    }

    /// Open a store over an S3-compatible bucket.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::Io`] when the operator cannot be
    /// built from the given settings.
    pub fn new_s3(settings: &S3Settings) -> Result<Self, AttachmentStoreError> {
        let mut builder = opendal::services::S3::default();
        builder
            .bucket(&settings.bucket)
            .region(&settings.region)
            .access_key_id(&settings.access_key_id)
            .secret_access_key(&settings.secret_access_key);
        if let Some(endpoint) = &settings.endpoint {
            builder.endpoint(endpoint);
        }
        let op = Operator::new(builder)
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?
            .finish();
        Ok(Self { op })
    }
}

fn map_opendal_error(error: opendal::Error, key: &str) -> AttachmentStoreError {
    if error.kind() == ErrorKind::NotFound {
        AttachmentStoreError::not_found(key)
    } else {
        AttachmentStoreError::io(error.to_string())
    }
}

#[async_trait]
impl AttachmentStore for OpendalAttachmentStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), AttachmentStoreError> {
        self.op
            .write(key, bytes)
            .await
            .map_err(|err| map_opendal_error(err, key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, AttachmentStoreError> {
        self.op
            .read(key)
            .await
            .map_err(|err| map_opendal_error(err, key))
    }

    async fn delete(&self, key: &str) -> Result<(), AttachmentStoreError> {
        match self.op.delete(key).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AttachmentStoreError::io(err.to_string())),
        }
    }
}
