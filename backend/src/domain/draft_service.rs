//! Draft autosave service implementing the driving port.
//!
//! Saves are revision-checked: the original system's last-writer-wins
//! autosave could silently clobber a newer draft from another tab; here the
//! stale writer gets a conflict carrying the actual revision so the client
//! can refetch.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use uuid::Uuid;

use super::draft::CanvassDraft;
use super::error::Error;
use super::ports::{
    DraftRepository, DraftRepositoryError, DraftWorkflow, TicketRepository, UserRepository,
};
use super::ticket::{Ticket, TicketStatus, map_ticket_error, map_user_error};
use super::user::{Role, User, UserId};

/// Autosave service over draft persistence.
#[derive(Clone)]
pub struct DraftService {
    drafts: Arc<dyn DraftRepository>,
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl DraftService {
    /// Create a service over the given ports.
    #[must_use]
    pub fn new(
        drafts: Arc<dyn DraftRepository>,
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            drafts,
            tickets,
            users,
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
            return Err(Error::not_found("ticket not found"));
        }
        Ok(ticket)
    }
}

fn map_draft_error(error: DraftRepositoryError) -> Error {
    match error {
        DraftRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("draft store unavailable: {message}"))
        }
        DraftRepositoryError::Query { message } => {
            Error::internal(format!("draft store error: {message}"))
        }
        DraftRepositoryError::RevisionMismatch { expected, actual } => {
            Error::conflict("draft revision mismatch").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
                "code": "revision_mismatch",
            }))
        }
    }
}

#[async_trait]
impl DraftWorkflow for DraftService {
    async fn get(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
    ) -> Result<Option<CanvassDraft>, Error> {
        let actor_user = self.require_actor(actor).await?;
        self.require_visible_ticket(&actor_user, ticket_id).await?;
        self.drafts
            .find(ticket_id, actor)
            .await
            .map_err(map_draft_error)
    }

    async fn save(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        form: Value,
        upload_ids: Vec<Uuid>,
        expected_revision: Option<i32>,
    ) -> Result<CanvassDraft, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;

        if !matches!(actor_user.role, Role::Purchaser | Role::Admin) {
            return Err(Error::forbidden("only purchasers keep canvass drafts"));
        }
        if ticket.status != TicketStatus::WorkInProgress {
            return Err(Error::conflict(format!(
                "drafts are only kept while canvassing (status: {})",
                ticket.status
            )));
        }

        self.drafts
            .upsert(
                ticket_id,
                actor,
                &form,
                &upload_ids,
                expected_revision,
                self.clock.utc(),
            )
            .await
            .map_err(map_draft_error)
    }

    async fn discard(&self, actor: &UserId, ticket_id: Uuid) -> Result<bool, Error> {
        let actor_user = self.require_actor(actor).await?;
        self.require_visible_ticket(&actor_user, ticket_id).await?;
        self.drafts
            .delete(ticket_id, actor)
            .await
            .map_err(map_draft_error)
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for [`DraftService`].
    use chrono::Utc;
    use mockable::DefaultClock;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        MockDraftRepository, MockTicketRepository, MockUserRepository,
    };
    use crate::domain::ticket::{ItemDetails, TicketName};
    use crate::domain::user::{DisplayName, EmailAddress};

    fn harness(
        actor: &UserId,
        role: Role,
        status: TicketStatus,
    ) -> (MockDraftRepository, MockTicketRepository, MockUserRepository, Uuid) {
        let profile = User::new(
            actor.clone(),
            DisplayName::new("Pat").expect("valid name"),
            EmailAddress::new("pat@corp.example").expect("valid email"),
            role,
        );
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(profile.clone())));

        let ticket = Ticket {
            id: Uuid::new_v4(),
            name: TicketName::compose(9, Utc::now().date_naive()),
            item: ItemDetails::new("widget", "", 1, None).expect("valid item"),
            status,
            created_by: actor.clone(),
            is_revised: false,
            reviewers: vec![UserId::random()],
            shared_with: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let ticket_id = ticket.id;
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find()
            .returning(move |_| Ok(Some(ticket.clone())));

        (MockDraftRepository::new(), tickets, users, ticket_id)
    }

    fn service(
        drafts: MockDraftRepository,
        tickets: MockTicketRepository,
        users: MockUserRepository,
    ) -> DraftService {
        DraftService::new(
            Arc::new(drafts),
            Arc::new(tickets),
            Arc::new(users),
            Arc::new(DefaultClock),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn saves_pass_the_revision_check_through() {
        let actor = UserId::random();
        let (mut drafts, tickets, users, ticket_id) =
            harness(&actor, Role::Purchaser, TicketStatus::WorkInProgress);
        let saved_for = actor.clone();
        drafts
            .expect_upsert()
            .withf(|_, _, _, _, expected, _| *expected == Some(2))
            .return_once(move |ticket_id, user, form, _, _, saved_at| {
                Ok(CanvassDraft {
                    ticket_id,
                    user_id: user.clone(),
                    form: form.clone(),
                    revision: 3,
                    updated_at: saved_at,
                    upload_ids: Vec::new(),
                })
            });

        let draft = service(drafts, tickets, users)
            .save(&saved_for, ticket_id, json!({ "a": 1 }), Vec::new(), Some(2))
            .await
            .expect("save succeeds");
        assert_eq!(draft.revision, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_saves_surface_the_actual_revision() {
        let actor = UserId::random();
        let (mut drafts, tickets, users, ticket_id) =
            harness(&actor, Role::Purchaser, TicketStatus::WorkInProgress);
        drafts.expect_upsert().return_once(|_, _, _, _, _, _| {
            Err(DraftRepositoryError::revision_mismatch(2, 5))
        });

        let error = service(drafts, tickets, users)
            .save(&actor, ticket_id, json!({}), Vec::new(), Some(2))
            .await
            .expect_err("must reject");
        assert_eq!(error.code(), ErrorCode::Conflict);
        let details = error.details().expect("details present");
        assert_eq!(details["actualRevision"], 5);
    }

    #[rstest]
    #[tokio::test]
    async fn saves_outside_canvassing_are_conflicts() {
        let actor = UserId::random();
        let (drafts, tickets, users, ticket_id) =
            harness(&actor, Role::Purchaser, TicketStatus::ForReviewOfSubmissions);

        let error = service(drafts, tickets, users)
            .save(&actor, ticket_id, json!({}), Vec::new(), None)
            .await
            .expect_err("must reject");
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn discard_reports_whether_a_draft_existed() {
        let actor = UserId::random();
        let (mut drafts, tickets, users, ticket_id) =
            harness(&actor, Role::Purchaser, TicketStatus::WorkInProgress);
        drafts.expect_delete().return_once(|_, _| Ok(false));

        let existed = service(drafts, tickets, users)
            .discard(&actor, ticket_id)
            .await
            .expect("discard succeeds");
        assert!(!existed);
    }
}
