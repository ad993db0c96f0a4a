//! Port for reviewer approval persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::approval::{Approval, ApprovalStatus};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by approval repository adapters.
    pub enum ApprovalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "approval repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "approval repository query failed: {message}",
        /// No approval row exists for this (ticket, reviewer) pair.
        NotAssigned { ticket_id: String, reviewer_id: String } =>
            "user {reviewer_id} is not a reviewer of ticket {ticket_id}",
        /// The reviewer already made a final decision.
        AlreadyDecided { status: String } =>
            "approval already decided: {status}",
    }
}

/// Port for approval storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// All approval rows for a ticket, in reviewer assignment order.
    async fn list_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<Approval>, ApprovalRepositoryError>;

    /// One reviewer's approval row for a ticket.
    async fn find(
        &self,
        ticket_id: Uuid,
        reviewer_id: &UserId,
    ) -> Result<Option<Approval>, ApprovalRepositoryError>;

    /// Record a reviewer's final status and review date, then return the
    /// ticket's full post-decision approval set.
    ///
    /// The update applies only while the row is undecided; a second
    /// decision reports [`ApprovalRepositoryError::AlreadyDecided`]. The
    /// update and the re-read happen in one transaction so the returned set
    /// is the basis every concurrent decider aggregates from.
    async fn record_decision(
        &self,
        ticket_id: Uuid,
        reviewer_id: &UserId,
        status: ApprovalStatus,
        review_date: DateTime<Utc>,
    ) -> Result<Vec<Approval>, ApprovalRepositoryError>;
}
