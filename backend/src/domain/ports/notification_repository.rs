//! Port for notification persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
        /// Referenced notification does not exist or belongs to another
        /// user.
        NotFound { notification_id: String } =>
            "notification not found: {notification_id}",
    }
}

/// Keyset position within a notification listing (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationListCursor {
    /// `created_at` of the last row on the previous page.
    pub created_at: DateTime<Utc>,
    /// Tiebreaker id of that row.
    pub id: Uuid,
}

/// Port for notification storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a batch of notifications, returning the stored records with
    /// ids, timestamps, and ticket names resolved.
    async fn insert_many(
        &self,
        notifications: &[NewNotification],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// List one user's notifications newest first.
    async fn page_for_user(
        &self,
        user_id: &UserId,
        cursor: Option<NotificationListCursor>,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Number of unread notifications for a user.
    async fn unread_count(&self, user_id: &UserId)
    -> Result<i64, NotificationRepositoryError>;

    /// Mark one of the user's notifications read.
    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: &UserId,
    ) -> Result<(), NotificationRepositoryError>;

    /// Mark everything read, returning how many rows changed.
    async fn mark_all_read(&self, user_id: &UserId)
    -> Result<i64, NotificationRepositoryError>;
}
