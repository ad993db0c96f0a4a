//! Wire-level message definitions for the WebSocket adapter.
//!
//! Stored notifications are transformed into these payloads before being
//! serialized to JSON and pushed to connected clients.

use serde::Serialize;

use crate::domain::notification::Notification;

/// Outbound payload pushed for each stored notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFrame {
    /// Frame discriminator, always `"notification"`.
    pub kind: &'static str,
    /// Notification id.
    pub id: String,
    /// Ticket id.
    pub ticket_id: String,
    /// Ticket display code.
    pub ticket_name: String,
    /// Human-readable message.
    pub message: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<&Notification> for NotificationFrame {
    fn from(notification: &Notification) -> Self {
        Self {
            kind: "notification",
            id: notification.id.to_string(),
            ticket_id: notification.ticket_id.to_string(),
            ticket_name: notification.ticket_name.clone(),
            message: notification.message.clone(),
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Wire-shape coverage.
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;
    use crate::domain::UserId;

    #[rstest]
    fn frames_serialize_with_camel_case_keys() {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: UserId::random(),
            ticket_id: Uuid::new_v4(),
            ticket_name: "PT-0001-080626".to_owned(),
            message: "ping".to_owned(),
            read: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(NotificationFrame::from(&notification))
            .expect("serialise frame");
        assert_eq!(value["kind"], "notification");
        assert_eq!(value["ticketName"], "PT-0001-080626");
        assert!(value.get("createdAt").is_some());
    }
}
