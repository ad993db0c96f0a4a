//! Driving port for ticket comments.

use async_trait::async_trait;
use pagination::{Limit, Page};
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::error::Error;
use crate::domain::user::UserId;

/// Domain use-case port for commenting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentWorkflow: Send + Sync {
    /// List a ticket's comments oldest first, enforcing visibility.
    async fn list(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        cursor: Option<String>,
        limit: Limit,
    ) -> Result<Page<Comment>, Error>;

    /// Post a comment (optionally a reply) and notify participants.
    async fn post(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        body: String,
        reply_to: Option<Uuid>,
    ) -> Result<Comment, Error>;

    /// Edit the actor's own comment.
    async fn edit(&self, actor: &UserId, comment_id: Uuid, body: String)
    -> Result<Comment, Error>;

    /// Delete a comment: authors delete their own, admins delete any.
    async fn remove(&self, actor: &UserId, comment_id: Uuid) -> Result<(), Error>;
}
