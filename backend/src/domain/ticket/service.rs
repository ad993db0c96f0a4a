//! Ticket workflow service implementing the driving port.
//!
//! All status writes go through the repository's compare-and-set
//! transition; this service decides legality and authorisation first, and
//! runs notification fan-out only when its own write won.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::error::Error;
use crate::domain::listing::{decode_time_cursor, time_cursor};
use crate::domain::notification::NewNotification;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    ApprovalRepository, ApprovalRepositoryError, CanvassRepository, CanvassRepositoryError,
    TicketDetail, TicketFilter, TicketListCursor, TicketListRequest, TicketRepository,
    TicketRepositoryError, TicketScope, TicketWorkflow, TransitionOutcome, TransitionRequest,
    UserPersistenceError, UserRepository,
};
use crate::domain::ticket::{
    NewTicket, StatusHistoryEntry, Ticket, TicketAction, TicketStatus,
};
use crate::domain::user::{Role, User, UserId};

/// Workflow service over ticket persistence.
#[derive(Clone)]
pub struct TicketWorkflowService {
    tickets: Arc<dyn TicketRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    canvass: Arc<dyn CanvassRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl TicketWorkflowService {
    /// Create a service over the given ports.
    #[must_use]
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        approvals: Arc<dyn ApprovalRepository>,
        canvass: Arc<dyn CanvassRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            approvals,
            canvass,
            users,
            notifier,
            clock,
        }
    }

    async fn require_actor(&self, actor: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(actor)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("unknown user"))
    }

    async fn require_visible_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<Ticket, Error> {
        let ticket = self
            .tickets
            .find(ticket_id)
            .await
            .map_err(map_ticket_error)?
            .ok_or_else(|| Error::not_found("ticket not found"))?;
        if !ticket.visible_to(&actor.id, actor.role) {
            // Hide existence from users outside the ticket.
            return Err(Error::not_found("ticket not found"));
        }
        Ok(ticket)
    }
}

pub(crate) fn map_ticket_error(error: TicketRepositoryError) -> Error {
    match error {
        TicketRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ticket store unavailable: {message}"))
        }
        TicketRepositoryError::Query { message } => {
            Error::internal(format!("ticket store error: {message}"))
        }
        TicketRepositoryError::NotFound { .. } => Error::not_found("ticket not found"),
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

fn map_approval_error(error: ApprovalRepositoryError) -> Error {
    match error {
        ApprovalRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("approval store unavailable: {message}"))
        }
        ApprovalRepositoryError::Query { message } => {
            Error::internal(format!("approval store error: {message}"))
        }
        ApprovalRepositoryError::NotAssigned { .. } => {
            Error::forbidden("not a reviewer of this ticket")
        }
        ApprovalRepositoryError::AlreadyDecided { status } => {
            Error::conflict(format!("approval already decided: {status}"))
        }
    }
}

fn map_canvass_read_error(error: CanvassRepositoryError) -> Error {
    match error {
        CanvassRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("canvass store unavailable: {message}"))
        }
        other => Error::internal(format!("canvass store error: {other}")),
    }
}

fn status_conflict(expected: TicketStatus, actual: TicketStatus) -> Error {
    Error::conflict("ticket status changed").with_details(json!({
        "expected": expected,
        "actual": actual,
        "code": "status_conflict",
    }))
}

#[async_trait]
impl TicketWorkflow for TicketWorkflowService {
    async fn create(&self, actor: &UserId, new: NewTicket) -> Result<Ticket, Error> {
        let actor_user = self.require_actor(actor).await?;

        let reviewer_pool = self
            .users
            .list_ids_by_role(Role::Reviewer)
            .await
            .map_err(map_user_error)?;
        if let Some(invalid) = new
            .reviewers
            .iter()
            .find(|reviewer| !reviewer_pool.contains(reviewer))
        {
            return Err(
                Error::invalid_request("assigned reviewer lacks the reviewer role")
                    .with_details(json!({ "reviewerId": invalid.to_string() })),
            );
        }

        let today = self.clock.utc().date_naive();
        let ticket = self
            .tickets
            .create(&new, actor, today)
            .await
            .map_err(map_ticket_error)?;
        info!(ticket = %ticket.name, creator = %actor, "ticket created");

        let message = format!(
            "{} assigned you to review ticket {}",
            actor_user.display_name, ticket.name
        );
        let mut batch =
            NewNotification::fan_out(&ticket.reviewers, actor, ticket.id, &message);
        let shared_message = format!(
            "{} shared ticket {} with you",
            actor_user.display_name, ticket.name
        );
        batch.extend(NewNotification::fan_out(
            &ticket.shared_with,
            actor,
            ticket.id,
            &shared_message,
        ));
        self.notifier.notify(batch).await;

        Ok(ticket)
    }

    async fn list(
        &self,
        actor: &UserId,
        request: TicketListRequest,
    ) -> Result<Page<Ticket>, Error> {
        let actor_user = self.require_actor(actor).await?;

        let scope = if request.created_only {
            TicketScope::CreatedBy(actor.clone())
        } else if matches!(actor_user.role, Role::Admin | Role::Manager) {
            TicketScope::All
        } else {
            TicketScope::VisibleTo(actor.clone())
        };
        let filter = TicketFilter {
            scope,
            status: request.status,
        };

        let cursor = request
            .cursor
            .as_deref()
            .map(decode_time_cursor)
            .transpose()?
            .map(|(created_at, id)| TicketListCursor { created_at, id });

        let rows = self
            .tickets
            .list(&filter, cursor, request.limit.as_sql() + 1)
            .await
            .map_err(map_ticket_error)?;

        Page::from_rows(rows, request.limit, |t: &Ticket| {
            time_cursor(t.created_at, t.id)
        })
        .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))
    }

    async fn get(&self, actor: &UserId, ticket_id: Uuid) -> Result<TicketDetail, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;

        let approvals = self
            .approvals
            .list_for_ticket(ticket_id)
            .await
            .map_err(map_approval_error)?;
        let forms = self
            .canvass
            .list_for_ticket(ticket_id)
            .await
            .map_err(map_canvass_read_error)?;

        Ok(TicketDetail {
            ticket,
            approvals,
            forms,
        })
    }

    async fn apply_action(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        action: TicketAction,
        note: Option<String>,
    ) -> Result<Ticket, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;

        let is_creator = ticket.created_by == *actor;
        if !action.allowed(actor_user.role, is_creator) {
            return Err(Error::forbidden(format!(
                "role {} may not perform this action",
                actor_user.role
            )));
        }
        if !action.applies_from(ticket.status) {
            return Err(Error::conflict(format!(
                "illegal transition: {} -> {}",
                ticket.status,
                action.target()
            )));
        }

        let mut request =
            TransitionRequest::new(ticket_id, ticket.status, action.target(), actor.clone());
        if let Some(note) = note {
            request = request.with_note(note);
        }
        if action == TicketAction::Resubmit {
            request = request.marking_revised().resetting_approvals();
        }

        match self
            .tickets
            .transition(&request)
            .await
            .map_err(map_ticket_error)?
        {
            TransitionOutcome::Applied => {}
            TransitionOutcome::Lost { actual } => {
                return Err(status_conflict(ticket.status, actual));
            }
        }
        info!(
            ticket = %ticket.name,
            from = %ticket.status,
            to = %action.target(),
            actor = %actor,
            "ticket transition applied"
        );

        let message = format!(
            "{} {} ticket {}",
            actor_user.display_name,
            action.describe(),
            ticket.name
        );
        let batch =
            NewNotification::fan_out(&ticket.participants(), actor, ticket.id, &message);
        self.notifier.notify(batch).await;

        let mut updated = ticket;
        updated.status = action.target();
        if action == TicketAction::Resubmit {
            updated.is_revised = true;
        }
        Ok(updated)
    }

    async fn share(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        users: Vec<UserId>,
    ) -> Result<Vec<UserId>, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;

        if ticket.created_by != *actor && actor_user.role != Role::Admin {
            return Err(Error::forbidden("only the creator may share a ticket"));
        }
        if users.is_empty() {
            return Err(Error::invalid_request("no users to share with"));
        }

        let added = self
            .tickets
            .share(ticket_id, &users)
            .await
            .map_err(map_ticket_error)?;

        let message = format!(
            "{} shared ticket {} with you",
            actor_user.display_name, ticket.name
        );
        let batch = NewNotification::fan_out(&added, actor, ticket.id, &message);
        self.notifier.notify(batch).await;

        Ok(added)
    }

    async fn history(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error> {
        let actor_user = self.require_actor(actor).await?;
        self.require_visible_ticket(&actor_user, ticket_id).await?;
        self.tickets
            .history(ticket_id)
            .await
            .map_err(map_ticket_error)
    }
}
