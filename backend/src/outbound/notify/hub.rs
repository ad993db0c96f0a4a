//! In-process registry of live WebSocket connections for notification
//! fan-out.
//!
//! Each WebSocket session subscribes with its authenticated user id and
//! receives a channel; the hub pushes every stored notification for that
//! user to all of their live connections. Delivery is best effort — closed
//! channels are pruned on the next publish, and missed events remain
//! available through the persisted feed.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::ports::NotificationPublisher;
use crate::domain::user::UserId;

/// One live connection's sending half.
struct Subscriber {
    connection_id: Uuid,
    sender: mpsc::UnboundedSender<Notification>,
}

/// Registry of live connections keyed by user.
#[derive(Default)]
pub struct NotificationHub {
    subscribers: DashMap<Uuid, Vec<Subscriber>>,
}

impl NotificationHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `user`, returning its id and the
    /// receiving half.
    pub fn subscribe(
        &self,
        user: &UserId,
    ) -> (Uuid, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        self.subscribers
            .entry(*user.as_uuid())
            .or_default()
            .push(Subscriber {
                connection_id,
                sender,
            });
        debug!(user = %user, connection = %connection_id, "ws connection subscribed");
        (connection_id, receiver)
    }

    /// Remove a connection registered by [`NotificationHub::subscribe`].
    pub fn unsubscribe(&self, user: &UserId, connection_id: Uuid) {
        if let Some(mut entry) = self.subscribers.get_mut(user.as_uuid()) {
            entry.retain(|sub| sub.connection_id != connection_id);
        }
        self.subscribers
            .remove_if(user.as_uuid(), |_, subs| subs.is_empty());
    }

    /// Number of live connections for a user (test and metrics hook).
    #[must_use]
    pub fn connection_count(&self, user: &UserId) -> usize {
        self.subscribers
            .get(user.as_uuid())
            .map_or(0, |entry| entry.len())
    }
}

#[async_trait]
impl NotificationPublisher for NotificationHub {
    async fn publish(&self, notification: &Notification) {
        let Some(mut entry) = self.subscribers.get_mut(notification.user_id.as_uuid())
        else {
            return;
        };
        // Closed receivers surface as send errors; prune them here.
        entry.retain(|sub| sub.sender.send(notification.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    //! Fan-out and pruning coverage.
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    fn notification(user: &UserId) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            ticket_id: Uuid::new_v4(),
            ticket_name: "PT-0001-080626".to_owned(),
            message: "ping".to_owned(),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn every_live_connection_of_the_recipient_gets_the_event() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let (_, mut rx_a) = hub.subscribe(&user);
        let (_, mut rx_b) = hub.subscribe(&user);
        let other = UserId::random();
        let (_, mut rx_other) = hub.subscribe(&other);

        hub.publish(&notification(&user)).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_other.try_recv().is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_connections_are_pruned_on_publish() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let (_, rx) = hub.subscribe(&user);
        drop(rx);
        assert_eq!(hub.connection_count(&user), 1);

        hub.publish(&notification(&user)).await;
        assert_eq!(hub.connection_count(&user), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn unsubscribe_removes_only_the_named_connection() {
        let hub = NotificationHub::new();
        let user = UserId::random();
        let (id_a, _rx_a) = hub.subscribe(&user);
        let (_, mut rx_b) = hub.subscribe(&user);

        hub.unsubscribe(&user, id_a);
        assert_eq!(hub.connection_count(&user), 1);

        hub.publish(&notification(&user)).await;
        assert!(rx_b.try_recv().is_ok());
    }
}
