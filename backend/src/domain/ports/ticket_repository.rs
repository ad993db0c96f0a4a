//! Port for ticket persistence, including the compare-and-set status
//! transition that underpins every workflow invariant.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::ticket::{NewTicket, StatusHistoryEntry, Ticket, TicketStatus};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ticket repository query failed: {message}",
        /// Referenced ticket does not exist.
        NotFound { ticket_id: String } =>
            "ticket not found: {ticket_id}",
    }
}

/// Visibility scope for ticket listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketScope {
    /// Every ticket (admins and managers).
    All,
    /// Only tickets the user created, reviews, or has been shared.
    VisibleTo(UserId),
    /// Only tickets the user created.
    CreatedBy(UserId),
}

/// Filter for ticket listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    /// Visibility scope.
    pub scope: TicketScope,
    /// Restrict to a single status.
    pub status: Option<TicketStatus>,
}

/// Keyset position within a ticket listing (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketListCursor {
    /// `created_at` of the last row on the previous page.
    pub created_at: DateTime<Utc>,
    /// Tiebreaker id of that row.
    pub id: Uuid,
}

/// Result of a compare-and-set status transition.
///
/// `Lost` is not an adapter failure: the row existed but its status no
/// longer matched the expectation, meaning another actor got there first.
/// Callers decide whether that is benign (a racing reviewer) or a user
/// error (an illegal action) — only the `Applied` winner runs side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This caller's write won; side effects may fire.
    Applied,
    /// Another writer changed the status first.
    Lost {
        /// Status found in place of the expected one.
        actual: TicketStatus,
    },
}

/// Instruction for a single compare-and-set transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    /// Ticket to transition.
    pub ticket_id: Uuid,
    /// Status the caller observed.
    pub expected: TicketStatus,
    /// Status to move into.
    pub next: TicketStatus,
    /// Actor recorded in the history row.
    pub actor: UserId,
    /// Optional note recorded in the history row.
    pub note: Option<String>,
    /// Set the ticket's `is_revised` flag alongside the write.
    pub mark_revised: bool,
    /// Reset every approval row to `PENDING` alongside the write
    /// (used when a revised ticket re-enters canvassing).
    pub reset_approvals: bool,
}

impl TransitionRequest {
    /// Build a plain transition with no flag side effects.
    #[must_use]
    pub const fn new(
        ticket_id: Uuid,
        expected: TicketStatus,
        next: TicketStatus,
        actor: UserId,
    ) -> Self {
        Self {
            ticket_id,
            expected,
            next,
            actor,
            note: None,
            mark_revised: false,
            reset_approvals: false,
        }
    }

    /// Attach a history note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Request the `is_revised` flag to be set.
    #[must_use]
    pub const fn marking_revised(mut self) -> Self {
        self.mark_revised = true;
        self
    }

    /// Request the approval rows to be reset to `PENDING`.
    #[must_use]
    pub const fn resetting_approvals(mut self) -> Self {
        self.reset_approvals = true;
        self
    }
}

/// Port for ticket storage and workflow writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Create a ticket, allocating its sequence-and-date name, reviewer
    /// approval rows, share rows, and the first history entry in one
    /// transaction.
    async fn create(
        &self,
        new: &NewTicket,
        created_by: &UserId,
        on_date: NaiveDate,
    ) -> Result<Ticket, TicketRepositoryError>;

    /// Fetch a ticket by id, including reviewers and sharees.
    async fn find(&self, ticket_id: Uuid) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// List tickets newest first, resuming after `cursor` when given.
    ///
    /// Fetches up to `limit` rows; callers pass `limit + 1` to detect a
    /// further page.
    async fn list(
        &self,
        filter: &TicketFilter,
        cursor: Option<TicketListCursor>,
        limit: i64,
    ) -> Result<Vec<Ticket>, TicketRepositoryError>;

    /// Apply a compare-and-set status transition.
    ///
    /// On success the status write, optional flag updates, and the history
    /// row commit in the same database transaction. A status mismatch
    /// reports [`TransitionOutcome::Lost`] and writes nothing.
    async fn transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, TicketRepositoryError>;

    /// Share the ticket with `users`, returning the newly added ids
    /// (already-shared users are skipped, not errors).
    async fn share(
        &self,
        ticket_id: Uuid,
        users: &[UserId],
    ) -> Result<Vec<UserId>, TicketRepositoryError>;

    /// Status audit trail, oldest first.
    async fn history(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, TicketRepositoryError>;
}
