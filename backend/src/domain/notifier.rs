//! Notification fan-out and the per-user feed.
//!
//! Workflow services hand completed fan-out batches to
//! [`NotificationService::notify`]. Persistence failures there are logged
//! and swallowed: a notification is an announcement about a workflow step
//! that already committed, and failing the step retroactively would leave
//! the system in a worse state than a missed message.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Limit, Page};
use tracing::warn;
use uuid::Uuid;

use super::error::Error;
use super::listing::{decode_time_cursor, time_cursor};
use super::notification::{NewNotification, Notification};
use super::ports::{
    NotificationFeed, NotificationFeedPage, NotificationListCursor, NotificationPublisher,
    NotificationRepository, NotificationRepositoryError,
};
use super::user::UserId;

/// Stores notifications and pushes them to live connections; also serves
/// the feed endpoints.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Create a service over the given repository and publisher.
    #[must_use]
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            publisher,
            clock,
        }
    }

    /// Persist a fan-out batch and push each stored notification to the
    /// recipient's live connections. Best effort; never fails the caller.
    pub async fn notify(&self, batch: Vec<NewNotification>) {
        if batch.is_empty() {
            return;
        }
        let stored = match self.repo.insert_many(&batch, self.clock.utc()).await {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%error, count = batch.len(), "failed to persist notifications");
                return;
            }
        };
        for notification in &stored {
            self.publisher.publish(notification).await;
        }
    }
}

fn map_repo_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification store unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification store error: {message}"))
        }
        NotificationRepositoryError::NotFound { notification_id } => {
            Error::not_found(format!("notification not found: {notification_id}"))
        }
    }
}

/// Decode an opaque feed cursor into a keyset position.
fn decode_cursor(token: &str) -> Result<NotificationListCursor, Error> {
    let (created_at, id) = decode_time_cursor(token)?;
    Ok(NotificationListCursor { created_at, id })
}

#[async_trait]
impl NotificationFeed for NotificationService {
    async fn list(
        &self,
        actor: &UserId,
        cursor: Option<String>,
        limit: Limit,
    ) -> Result<NotificationFeedPage, Error> {
        let cursor = cursor.as_deref().map(decode_cursor).transpose()?;
        let rows = self
            .repo
            .page_for_user(actor, cursor, limit.as_sql() + 1)
            .await
            .map_err(map_repo_error)?;
        let unread = self.repo.unread_count(actor).await.map_err(map_repo_error)?;

        let page = Page::from_rows(rows, limit, |n: &Notification| {
            time_cursor(n.created_at, n.id)
        })
        .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))?;

        Ok(NotificationFeedPage { page, unread })
    }

    async fn mark_read(&self, actor: &UserId, notification_id: Uuid) -> Result<(), Error> {
        self.repo
            .mark_read(notification_id, actor)
            .await
            .map_err(map_repo_error)
    }

    async fn mark_all_read(&self, actor: &UserId) -> Result<i64, Error> {
        self.repo.mark_all_read(actor).await.map_err(map_repo_error)
    }
}
