//! Reviewer decision service implementing the driving port.
//!
//! The original system recomputed ticket status by re-querying and branching
//! after each approval write, so two concurrent final approvals could both
//! fire the manager notification. Here the decision is recorded first, the
//! outcome is folded from the returned approval set, and the resulting
//! status change goes through the compare-and-set transition — whoever loses
//! that race simply skips the side effects.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::approval::{
    Approval, ApprovalStatus, ReviewDecision, ReviewOutcome, review_outcome,
};
use crate::domain::error::Error;
use crate::domain::notification::NewNotification;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    ApprovalRepository, ApprovalRepositoryError, ReviewReceipt, ReviewWorkflow,
    TicketRepository, TransitionOutcome, TransitionRequest, UserRepository,
};
use crate::domain::ticket::{Ticket, TicketStatus, map_ticket_error, map_user_error};
use crate::domain::user::{Role, User, UserId};

/// Reviewer sign-off service over approval and ticket persistence.
#[derive(Clone)]
pub struct ReviewService {
    tickets: Arc<dyn TicketRepository>,
    approvals: Arc<dyn ApprovalRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    /// Create a service over the given ports.
    #[must_use]
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        approvals: Arc<dyn ApprovalRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            approvals,
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

    async fn require_ticket(&self, actor: &User, ticket_id: Uuid) -> Result<Ticket, Error> {
        let ticket = self
            .tickets
            .find(ticket_id)
            .await
            .map_err(map_ticket_error)?
            .ok_or_else(|| Error::not_found("ticket not found"))?;
        if !ticket.visible_to(&actor.id, actor.role) {
            return Err(Error::not_found("ticket not found"));
        }
        Ok(ticket)
    }

    /// Fire the status transition implied by an aggregated outcome.
    ///
    /// Returns the ticket status after this call. Losing the race is benign
    /// here: the decision row is already recorded, and the winner owns the
    /// side effects.
    async fn fold_outcome(
        &self,
        actor: &User,
        ticket: &Ticket,
        outcome: ReviewOutcome,
        note: Option<String>,
    ) -> Result<TicketStatus, Error> {
        let next = match outcome {
            ReviewOutcome::AwaitingOthers => return Ok(ticket.status),
            ReviewOutcome::AllApproved => TicketStatus::ForApproval,
            ReviewOutcome::RevisionRequested => TicketStatus::ForRevision,
            ReviewOutcome::Rejected => TicketStatus::Rejected,
        };

        let mut request = TransitionRequest::new(
            ticket.id,
            TicketStatus::ForReviewOfSubmissions,
            next,
            actor.id.clone(),
        );
        if let Some(note) = note {
            request = request.with_note(note);
        }

        match self
            .tickets
            .transition(&request)
            .await
            .map_err(map_ticket_error)?
        {
            TransitionOutcome::Applied => {
                info!(ticket = %ticket.name, to = %next, "review outcome applied");
                self.notify_outcome(actor, ticket, outcome).await;
                Ok(next)
            }
            TransitionOutcome::Lost { actual } => Ok(actual),
        }
    }

    /// Winner-only notification fan-out for a folded outcome.
    async fn notify_outcome(&self, actor: &User, ticket: &Ticket, outcome: ReviewOutcome) {
        let mut batch = Vec::new();
        match outcome {
            ReviewOutcome::AwaitingOthers => {}
            ReviewOutcome::AllApproved => {
                let managers = match self.users.list_ids_by_role(Role::Manager).await {
                    Ok(managers) => managers,
                    Err(error) => {
                        tracing::warn!(%error, "failed to resolve managers for notification");
                        Vec::new()
                    }
                };
                let message = format!("ticket {} is awaiting your approval", ticket.name);
                batch.extend(NewNotification::fan_out(
                    &managers,
                    &actor.id,
                    ticket.id,
                    &message,
                ));
                let creator_message =
                    format!("all reviewers approved ticket {}", ticket.name);
                batch.extend(NewNotification::fan_out(
                    &[ticket.created_by.clone()],
                    &actor.id,
                    ticket.id,
                    &creator_message,
                ));
            }
            ReviewOutcome::RevisionRequested | ReviewOutcome::Rejected => {
                let message = format!(
                    "{} {} on ticket {}",
                    actor.display_name,
                    match outcome {
                        ReviewOutcome::RevisionRequested => "requested a revision",
                        _ => "rejected the submission",
                    },
                    ticket.name
                );
                batch.extend(NewNotification::fan_out(
                    &ticket.participants(),
                    &actor.id,
                    ticket.id,
                    &message,
                ));
            }
        }
        self.notifier.notify(batch).await;
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
            Error::conflict("approval already decided").with_details(json!({
                "status": status,
                "code": "already_decided",
            }))
        }
    }
}

#[async_trait]
impl ReviewWorkflow for ReviewService {
    async fn list(&self, actor: &UserId, ticket_id: Uuid) -> Result<Vec<Approval>, Error> {
        let actor_user = self.require_actor(actor).await?;
        self.require_ticket(&actor_user, ticket_id).await?;
        self.approvals
            .list_for_ticket(ticket_id)
            .await
            .map_err(map_approval_error)
    }

    async fn decide(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<ReviewReceipt, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_ticket(&actor_user, ticket_id).await?;

        if !ticket.reviewers.contains(actor) {
            return Err(Error::forbidden("not a reviewer of this ticket"));
        }
        if ticket.status != TicketStatus::ForReviewOfSubmissions {
            return Err(Error::conflict(format!(
                "ticket is not awaiting review (status: {})",
                ticket.status
            )));
        }

        let now = self.clock.utc();
        let (approval, outcome) = match decision {
            ReviewDecision::Approve | ReviewDecision::Reject => {
                let recorded_status = if decision == ReviewDecision::Approve {
                    ApprovalStatus::Approved
                } else {
                    ApprovalStatus::Rejected
                };
                let approvals = self
                    .approvals
                    .record_decision(ticket_id, actor, recorded_status, now)
                    .await
                    .map_err(map_approval_error)?;
                let own = approvals
                    .iter()
                    .find(|approval| approval.reviewer_id == *actor)
                    .cloned()
                    .ok_or_else(|| {
                        Error::internal("recorded decision missing from approval set")
                    })?;
                (own, review_outcome(decision, &approvals))
            }
            ReviewDecision::RequestRevision => {
                // Revision requests do not consume the reviewer's decision;
                // the approval set resets when the ticket is resubmitted.
                let own = self
                    .approvals
                    .find(ticket_id, actor)
                    .await
                    .map_err(map_approval_error)?
                    .ok_or_else(|| Error::forbidden("not a reviewer of this ticket"))?;
                (own, ReviewOutcome::RevisionRequested)
            }
        };

        let ticket_status = self.fold_outcome(&actor_user, &ticket, outcome, note).await?;

        Ok(ReviewReceipt {
            approval,
            ticket_status,
        })
    }
}
