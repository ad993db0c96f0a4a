//! Driving port for the per-user notification feed.

use async_trait::async_trait;
use pagination::{Limit, Page};
use uuid::Uuid;

use crate::domain::error::Error;
use crate::domain::notification::Notification;
use crate::domain::user::UserId;

/// One page of a user's feed plus their unread count.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFeedPage {
    /// Notifications newest first.
    pub page: Page<Notification>,
    /// Unread notifications across the whole feed.
    pub unread: i64,
}

/// Domain use-case port for the notification feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// List the actor's notifications newest first.
    async fn list(
        &self,
        actor: &UserId,
        cursor: Option<String>,
        limit: Limit,
    ) -> Result<NotificationFeedPage, Error>;

    /// Mark one notification read.
    async fn mark_read(&self, actor: &UserId, notification_id: Uuid) -> Result<(), Error>;

    /// Mark the whole feed read, returning how many changed.
    async fn mark_all_read(&self, actor: &UserId) -> Result<i64, Error>;
}
