//! Port for canvass draft persistence with revision-checked upserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::draft::CanvassDraft;
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by draft repository adapters.
    pub enum DraftRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "draft repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "draft repository query failed: {message}",
        /// The caller's revision expectation no longer matches the row.
        RevisionMismatch { expected: i32, actual: i32 } =>
            "draft revision mismatch: expected {expected}, found {actual}",
    }
}

/// Port for draft storage.
///
/// # Revision semantics
///
/// - A first save (`expected_revision = None`) inserts at revision 1; if a
///   row already exists this is a mismatch against its current revision.
/// - A follow-up save must pass the revision it last observed; on match the
///   row is updated and the revision incremented, otherwise
///   [`DraftRepositoryError::RevisionMismatch`] reports the actual value so
///   the client can refetch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Fetch the draft for a (ticket, user) pair.
    async fn find(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
    ) -> Result<Option<CanvassDraft>, DraftRepositoryError>;

    /// Insert or update the draft under a revision check, returning the
    /// stored state.
    async fn upsert(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
        form: &Value,
        upload_ids: &[Uuid],
        expected_revision: Option<i32>,
        saved_at: DateTime<Utc>,
    ) -> Result<CanvassDraft, DraftRepositoryError>;

    /// Delete the draft, reporting whether it existed.
    async fn delete(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
    ) -> Result<bool, DraftRepositoryError>;
}
