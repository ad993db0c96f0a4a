//! Comment service implementing the driving port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Limit, Page};
use serde_json::json;
use uuid::Uuid;

use super::comment::{Comment, validate_body};
use super::error::Error;
use super::listing::{decode_time_cursor, time_cursor};
use super::notification::NewNotification;
use super::notifier::NotificationService;
use super::ports::{
    CommentListCursor, CommentRepository, CommentRepositoryError, CommentWorkflow,
    TicketRepository, UserRepository,
};
use super::ticket::{Ticket, map_ticket_error, map_user_error};
use super::user::{Role, User, UserId};

/// Commenting service over comment persistence.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    /// Create a service over the given ports.
    #[must_use]
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            comments,
            tickets,
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
            return Err(Error::not_found("ticket not found"));
        }
        Ok(ticket)
    }
}

fn map_comment_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("comment store unavailable: {message}"))
        }
        CommentRepositoryError::Query { message } => {
            Error::internal(format!("comment store error: {message}"))
        }
        CommentRepositoryError::NotFound { .. } => Error::not_found("comment not found"),
        CommentRepositoryError::ParentMismatch { parent_id } => {
            Error::invalid_request("parent comment not found on this ticket")
                .with_details(json!({ "parentId": parent_id, "code": "parent_mismatch" }))
        }
    }
}

#[async_trait]
impl CommentWorkflow for CommentService {
    async fn list(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        cursor: Option<String>,
        limit: Limit,
    ) -> Result<Page<Comment>, Error> {
        let actor_user = self.require_actor(actor).await?;
        self.require_visible_ticket(&actor_user, ticket_id).await?;

        let cursor = cursor
            .as_deref()
            .map(decode_time_cursor)
            .transpose()?
            .map(|(created_at, id)| CommentListCursor { created_at, id });

        let rows = self
            .comments
            .page_for_ticket(ticket_id, cursor, limit.as_sql() + 1)
            .await
            .map_err(map_comment_error)?;

        Page::from_rows(rows, limit, |c: &Comment| time_cursor(c.created_at, c.id))
            .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))
    }

    async fn post(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        body: String,
        reply_to: Option<Uuid>,
    ) -> Result<Comment, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;

        let body = validate_body(&body)
            .map_err(|err| Error::invalid_request(err.to_string()))?
            .to_owned();

        let now = self.clock.utc();
        let comment = Comment {
            id: Uuid::new_v4(),
            ticket_id,
            author_id: actor.clone(),
            body,
            reply_to,
            edited: false,
            created_at: now,
            updated_at: now,
        };
        self.comments
            .insert(&comment)
            .await
            .map_err(map_comment_error)?;

        let message = format!(
            "{} commented on ticket {}",
            actor_user.display_name, ticket.name
        );
        let batch =
            NewNotification::fan_out(&ticket.participants(), actor, ticket.id, &message);
        self.notifier.notify(batch).await;

        Ok(comment)
    }

    async fn edit(
        &self,
        actor: &UserId,
        comment_id: Uuid,
        body: String,
    ) -> Result<Comment, Error> {
        self.require_actor(actor).await?;
        let existing = self
            .comments
            .find(comment_id)
            .await
            .map_err(map_comment_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        if existing.author_id != *actor {
            return Err(Error::forbidden("only the author may edit a comment"));
        }

        let body = validate_body(&body)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.comments
            .update_body(comment_id, body, self.clock.utc())
            .await
            .map_err(map_comment_error)
    }

    async fn remove(&self, actor: &UserId, comment_id: Uuid) -> Result<(), Error> {
        let actor_user = self.require_actor(actor).await?;
        let existing = self
            .comments
            .find(comment_id)
            .await
            .map_err(map_comment_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        if existing.author_id != *actor && actor_user.role != Role::Admin {
            return Err(Error::forbidden("only the author or an admin may delete"));
        }

        let deleted = self
            .comments
            .delete(comment_id)
            .await
            .map_err(map_comment_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found("comment not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for [`CommentService`].
    use chrono::Utc;
    use mockable::DefaultClock;
    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{
        MockCommentRepository, MockNotificationPublisher, MockNotificationRepository,
        MockTicketRepository, MockUserRepository,
    };
    use crate::domain::ticket::{ItemDetails, TicketName, TicketStatus};
    use crate::domain::user::{DisplayName, EmailAddress};

    struct Mocks {
        comments: MockCommentRepository,
        tickets: MockTicketRepository,
        users: MockUserRepository,
        notifications: MockNotificationRepository,
        ticket_id: Uuid,
    }

    fn harness(actor: &UserId, role: Role) -> Mocks {
        let profile = User::new(
            actor.clone(),
            DisplayName::new("Casey").expect("valid name"),
            EmailAddress::new("casey@corp.example").expect("valid email"),
            role,
        );
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(profile.clone())));

        let ticket = Ticket {
            id: Uuid::new_v4(),
            name: TicketName::compose(5, Utc::now().date_naive()),
            item: ItemDetails::new("widget", "", 1, None).expect("valid item"),
            status: TicketStatus::WorkInProgress,
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

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert_many()
            .returning(|_, _| Ok(Vec::new()));

        Mocks {
            comments: MockCommentRepository::new(),
            tickets,
            users,
            notifications,
            ticket_id,
        }
    }

    fn service(mocks: Mocks) -> (CommentService, Uuid) {
        let notifier = Arc::new(NotificationService::new(
            Arc::new(mocks.notifications),
            Arc::new(MockNotificationPublisher::new()),
            Arc::new(DefaultClock),
        ));
        (
            CommentService::new(
                Arc::new(mocks.comments),
                Arc::new(mocks.tickets),
                Arc::new(mocks.users),
                notifier,
                Arc::new(DefaultClock),
            ),
            mocks.ticket_id,
        )
    }

    fn stored_comment(author: &UserId) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            author_id: author.clone(),
            body: "original".to_owned(),
            reply_to: None,
            edited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn posting_trims_and_stores_the_body() {
        let actor = UserId::random();
        let mut mocks = harness(&actor, Role::Purchaser);
        mocks
            .comments
            .expect_insert()
            .withf(|comment| comment.body == "hello")
            .return_once(|_| Ok(()));

        let (service, ticket_id) = service(mocks);
        let comment = service
            .post(&actor, ticket_id, "  hello  ".to_owned(), None)
            .await
            .expect("post succeeds");
        assert_eq!(comment.body, "hello");
        assert!(!comment.edited);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_bodies_are_rejected() {
        let actor = UserId::random();
        let (service, ticket_id) = service(harness(&actor, Role::Purchaser));
        let error = service
            .post(&actor, ticket_id, "   ".to_owned(), None)
            .await
            .expect_err("must reject");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn only_the_author_edits() {
        let actor = UserId::random();
        let someone_else = UserId::random();
        let mut mocks = harness(&actor, Role::Purchaser);
        let existing = stored_comment(&someone_else);
        mocks
            .comments
            .expect_find()
            .return_once(move |_| Ok(Some(existing)));

        let (service, _) = service(mocks);
        let error = service
            .edit(&actor, Uuid::new_v4(), "update".to_owned())
            .await
            .expect_err("must reject");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn admins_may_delete_other_peoples_comments() {
        let actor = UserId::random();
        let author = UserId::random();
        let mut mocks = harness(&actor, Role::Admin);
        let existing = stored_comment(&author);
        mocks
            .comments
            .expect_find()
            .return_once(move |_| Ok(Some(existing)));
        mocks.comments.expect_delete().return_once(|_| Ok(true));

        let (service, _) = service(mocks);
        service
            .remove(&actor, Uuid::new_v4())
            .await
            .expect("delete succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn non_admin_non_authors_cannot_delete() {
        let actor = UserId::random();
        let author = UserId::random();
        let mut mocks = harness(&actor, Role::Reviewer);
        let existing = stored_comment(&author);
        mocks
            .comments
            .expect_find()
            .return_once(move |_| Ok(Some(existing)));

        let (service, _) = service(mocks);
        let error = service
            .remove(&actor, Uuid::new_v4())
            .await
            .expect_err("must reject");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }
}
