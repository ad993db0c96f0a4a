//! Port for ticket comment persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::comment::Comment;

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "comment repository query failed: {message}",
        /// Referenced comment does not exist.
        NotFound { comment_id: String } =>
            "comment not found: {comment_id}",
        /// `reply_to` does not name a comment on the same ticket.
        ParentMismatch { parent_id: String } =>
            "parent comment not found on this ticket: {parent_id}",
    }
}

/// Keyset position within a comment listing (oldest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentListCursor {
    /// `created_at` of the last row on the previous page.
    pub created_at: DateTime<Utc>,
    /// Tiebreaker id of that row.
    pub id: Uuid,
}

/// Port for comment storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment, validating any parent reference.
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError>;

    /// List comments oldest first, resuming after `cursor` when given.
    async fn page_for_ticket(
        &self,
        ticket_id: Uuid,
        cursor: Option<CommentListCursor>,
        limit: i64,
    ) -> Result<Vec<Comment>, CommentRepositoryError>;

    /// Fetch one comment.
    async fn find(&self, comment_id: Uuid)
    -> Result<Option<Comment>, CommentRepositoryError>;

    /// Replace a comment's body, marking it edited.
    async fn update_body(
        &self,
        comment_id: Uuid,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Comment, CommentRepositoryError>;

    /// Delete a comment and its replies, reporting whether it existed.
    async fn delete(&self, comment_id: Uuid) -> Result<bool, CommentRepositoryError>;
}
