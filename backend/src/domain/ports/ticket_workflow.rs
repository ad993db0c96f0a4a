//! Driving port for ticket use-cases: creation, listing, sharing, and
//! direct workflow actions.

use async_trait::async_trait;
use pagination::{Limit, Page};
use uuid::Uuid;

use crate::domain::approval::Approval;
use crate::domain::canvass::CanvassForm;
use crate::domain::error::Error;
use crate::domain::ticket::{
    NewTicket, StatusHistoryEntry, Ticket, TicketAction, TicketStatus,
};
use crate::domain::user::UserId;

/// A ticket joined with its approvals and submitted forms for detail views.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDetail {
    /// The ticket itself.
    pub ticket: Ticket,
    /// Reviewer sign-off records.
    pub approvals: Vec<Approval>,
    /// Submitted canvass forms, newest first.
    pub forms: Vec<CanvassForm>,
}

/// Listing filter accepted from clients, before visibility scoping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketListRequest {
    /// Restrict to one status.
    pub status: Option<TicketStatus>,
    /// Restrict to tickets the actor created.
    pub created_only: bool,
    /// Opaque continuation token from a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Limit,
}

/// Domain use-case port for ticket workflows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketWorkflow: Send + Sync {
    /// Create a ticket on behalf of `actor`.
    async fn create(&self, actor: &UserId, new: NewTicket) -> Result<Ticket, Error>;

    /// List tickets visible to `actor`, newest first.
    async fn list(
        &self,
        actor: &UserId,
        request: TicketListRequest,
    ) -> Result<Page<Ticket>, Error>;

    /// Fetch one ticket with approvals and forms, enforcing visibility.
    async fn get(&self, actor: &UserId, ticket_id: Uuid) -> Result<TicketDetail, Error>;

    /// Apply a direct workflow action, returning the updated ticket.
    async fn apply_action(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        action: TicketAction,
        note: Option<String>,
    ) -> Result<Ticket, Error>;

    /// Share a ticket with more users, returning the newly added ids.
    async fn share(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        users: Vec<UserId>,
    ) -> Result<Vec<UserId>, Error>;

    /// Status audit trail, oldest first, enforcing visibility.
    async fn history(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error>;
}
