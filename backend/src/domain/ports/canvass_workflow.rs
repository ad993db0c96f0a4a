//! Driving port for canvass uploads, submission, and attachment access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::canvass::{
    AttachmentKind, CanvassAttachment, CanvassForm, NewCanvassForm, PendingUpload,
};
use crate::domain::error::Error;
use crate::domain::user::UserId;

/// An upload request carrying the raw blob and its declared metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Declared attachment kind.
    pub kind: AttachmentKind,
    /// Original file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Raw blob content.
    pub bytes: Vec<u8>,
}

/// An attachment's metadata with its blob content.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDownload {
    /// Attachment metadata.
    pub attachment: CanvassAttachment,
    /// Blob content.
    pub bytes: Vec<u8>,
}

/// Domain use-case port for canvassing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CanvassWorkflow: Send + Sync {
    /// Store an upload ahead of submission.
    ///
    /// The blob goes to object storage and a pending-upload row records it;
    /// nothing touches the ticket until submission.
    async fn register_upload(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        request: UploadRequest,
    ) -> Result<PendingUpload, Error>;

    /// Submit a canvass form referencing previously uploaded blobs.
    async fn submit(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        form: NewCanvassForm,
        upload_ids: Vec<Uuid>,
    ) -> Result<CanvassForm, Error>;

    /// Download one attachment, enforcing ticket visibility.
    async fn open_attachment(
        &self,
        actor: &UserId,
        attachment_id: Uuid,
    ) -> Result<AttachmentDownload, Error>;

    /// Delete pending uploads older than the cutoff (blobs and rows),
    /// returning how many were reclaimed. Admin only.
    async fn sweep_orphan_uploads(
        &self,
        actor: &UserId,
        older_than: DateTime<Utc>,
    ) -> Result<u64, Error>;
}
