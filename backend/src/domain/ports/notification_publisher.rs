//! Port for best-effort realtime notification delivery.

use async_trait::async_trait;

use crate::domain::notification::Notification;

/// Push a stored notification to the recipient's live connections.
///
/// Delivery is best effort: implementations must not fail the surrounding
/// workflow when the recipient has no open connection. The persisted
/// notification list remains the source of truth for missed events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Deliver `notification` to any live connections of its recipient.
    async fn publish(&self, notification: &Notification);
}

/// Publisher that drops every event; used where realtime delivery is not
/// wired (tests, one-shot tools).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpNotificationPublisher;

#[async_trait]
impl NotificationPublisher for NoOpNotificationPublisher {
    async fn publish(&self, _notification: &Notification) {}
}
