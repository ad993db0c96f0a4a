//! Port for canvass form, attachment, and pending-upload persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::canvass::{CanvassAttachment, CanvassForm, PendingUpload};
use crate::domain::ticket::TicketStatus;
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by canvass repository adapters.
    pub enum CanvassRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "canvass repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "canvass repository query failed: {message}",
        /// Referenced ticket does not exist.
        TicketNotFound { ticket_id: String } =>
            "ticket not found: {ticket_id}",
        /// A referenced upload id is unknown, already consumed, or belongs
        /// to another ticket or uploader.
        UploadMissing { upload_id: String } =>
            "upload not found: {upload_id}",
        /// The ticket left the expected status before the submission
        /// committed.
        StatusConflict { expected: String, actual: String } =>
            "ticket status changed: expected {expected}, found {actual}",
    }
}

/// Port for canvass persistence.
///
/// `submit` is the atomicity boundary the original system lacked: the form
/// row, its attachment rows, pending-upload consumption, the ticket status
/// compare-and-set, the approval flips to `AWAITING ACTION`, the history
/// row, and the submitter's draft cleanup all commit or roll back together.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CanvassRepository: Send + Sync {
    /// Record a pending upload row for a stored blob.
    async fn register_upload(
        &self,
        upload: &PendingUpload,
    ) -> Result<(), CanvassRepositoryError>;

    /// Resolve pending uploads by id, scoped to one ticket and uploader.
    ///
    /// Every requested id must resolve; a miss reports
    /// [`CanvassRepositoryError::UploadMissing`].
    async fn resolve_uploads(
        &self,
        ticket_id: Uuid,
        uploaded_by: &UserId,
        upload_ids: &[Uuid],
    ) -> Result<Vec<PendingUpload>, CanvassRepositoryError>;

    /// Atomically persist a submission and advance the ticket from
    /// `expected_status` to `FOR REVIEW OF SUBMISSIONS`.
    async fn submit(
        &self,
        form: &CanvassForm,
        upload_ids: &[Uuid],
        expected_status: TicketStatus,
    ) -> Result<(), CanvassRepositoryError>;

    /// All submitted forms for a ticket, newest first, attachments included.
    async fn list_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<CanvassForm>, CanvassRepositoryError>;

    /// Fetch one attachment's metadata together with the id of the ticket
    /// its form belongs to.
    async fn find_attachment(
        &self,
        attachment_id: Uuid,
    ) -> Result<Option<(CanvassAttachment, Uuid)>, CanvassRepositoryError>;

    /// Pending uploads older than the cutoff, for the orphan sweep.
    async fn stale_uploads(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<PendingUpload>, CanvassRepositoryError>;

    /// Delete a pending upload row, reporting whether it existed.
    async fn delete_upload(&self, upload_id: Uuid) -> Result<bool, CanvassRepositoryError>;
}
