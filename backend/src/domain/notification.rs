//! Per-user notifications tied to tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// A message delivered to one user about one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: Uuid,
    /// Recipient.
    pub user_id: UserId,
    /// Ticket the message concerns.
    pub ticket_id: Uuid,
    /// Display name of the ticket for rendering without a join.
    pub ticket_name: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the recipient has seen it.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A notification not yet persisted, produced by workflow fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Ticket the message concerns.
    pub ticket_id: Uuid,
    /// Human-readable message.
    pub message: String,
}

impl NewNotification {
    /// Build one notification per recipient, skipping the excluded actor.
    ///
    /// Workflow events notify every participant except whoever caused the
    /// event; this helper centralises that rule.
    #[must_use]
    pub fn fan_out(
        recipients: &[UserId],
        exclude: &UserId,
        ticket_id: Uuid,
        message: &str,
    ) -> Vec<Self> {
        let mut seen: Vec<&UserId> = Vec::with_capacity(recipients.len());
        recipients
            .iter()
            .filter(|recipient| *recipient != exclude)
            .filter(|recipient| {
                if seen.contains(recipient) {
                    false
                } else {
                    seen.push(recipient);
                    true
                }
            })
            .map(|recipient| Self {
                user_id: recipient.clone(),
                ticket_id,
                message: message.to_owned(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! Fan-out rule coverage.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn fan_out_skips_the_actor_and_duplicates() {
        let actor = UserId::random();
        let other = UserId::random();
        let recipients = vec![actor.clone(), other.clone(), other.clone()];

        let out = NewNotification::fan_out(&recipients, &actor, Uuid::new_v4(), "ping");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].user_id, other);
        assert_eq!(out[0].message, "ping");
    }

    #[rstest]
    fn fan_out_with_no_other_recipients_is_empty() {
        let actor = UserId::random();
        let out = NewNotification::fan_out(&[actor.clone()], &actor, Uuid::new_v4(), "ping");
        assert!(out.is_empty());
    }
}
