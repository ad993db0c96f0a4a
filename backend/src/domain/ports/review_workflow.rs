//! Driving port for reviewer decisions on canvass submissions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::approval::{Approval, ReviewDecision};
use crate::domain::error::Error;
use crate::domain::ticket::TicketStatus;
use crate::domain::user::UserId;

/// What a recorded decision did to the ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewReceipt {
    /// The reviewer's updated approval row.
    pub approval: Approval,
    /// Ticket status after any triggered transition.
    pub ticket_status: TicketStatus,
}

/// Domain use-case port for reviewer sign-off.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewWorkflow: Send + Sync {
    /// Approval rows for a ticket, enforcing visibility.
    async fn list(&self, actor: &UserId, ticket_id: Uuid) -> Result<Vec<Approval>, Error>;

    /// Record `actor`'s decision on their own approval row and fold it
    /// into the ticket status.
    async fn decide(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<ReviewReceipt, Error>;
}
