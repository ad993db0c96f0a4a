//! Deterministic port doubles for HTTP integration tests.
//!
//! Each double is plain data: configure the canned success value or the
//! failure before wiring it into the app. Doubles stay deliberately dumb so
//! the tests read as HTTP contract checks, not re-tests of domain logic.

use async_trait::async_trait;
use chrono::Utc;
use pagination::{Limit, Page};
use uuid::Uuid;

use canvassing_backend::domain::approval::{Approval, ApprovalStatus, ReviewDecision};
use canvassing_backend::domain::auth::LoginCredentials;
use canvassing_backend::domain::canvass::{
    AttachmentKind, CanvassForm, NewCanvassForm, PendingUpload,
};
use canvassing_backend::domain::comment::Comment;
use canvassing_backend::domain::dashboard::DashboardSummary;
use canvassing_backend::domain::draft::CanvassDraft;
use canvassing_backend::domain::ports::{
    AttachmentDownload, CanvassWorkflow, CommentWorkflow, DashboardQuery, DashboardQueryError,
    DraftWorkflow, LoginService, NotificationFeed, NotificationFeedPage, ReviewReceipt,
    ReviewWorkflow, TicketDetail, TicketListRequest, TicketWorkflow, UploadRequest,
    UserCredentials, UserPersistenceError, UserRepository,
};
use canvassing_backend::domain::ticket::{
    ItemDetails, NewTicket, StatusHistoryEntry, Ticket, TicketAction, TicketName, TicketStatus,
};
use canvassing_backend::domain::user::{EmailAddress, Role, User, UserId};
use canvassing_backend::domain::{Error, UserId as ActorId};

use super::TEST_PASSWORD;

/// A canned ticket to hang tests off.
pub fn canned_ticket(created_by: &UserId) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        name: TicketName::compose(7, Utc::now().date_naive()),
        item: ItemDetails::new("laptops", "14 inch developer laptops", 3, None)
            .expect("valid item"),
        status: TicketStatus::ForCanvass,
        created_by: created_by.clone(),
        is_revised: false,
        reviewers: vec![UserId::random()],
        shared_with: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Login double: any configured account authenticates with the shared test
/// password.
pub struct StubLoginService {
    /// Accounts that may log in.
    pub users: Vec<User>,
}

#[async_trait]
impl LoginService for StubLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        if credentials.password() != TEST_PASSWORD {
            return Err(Error::unauthorized("invalid credentials"));
        }
        self.users
            .iter()
            .find(|user| user.email == *credentials.email())
            .cloned()
            .ok_or_else(|| Error::unauthorized("invalid credentials"))
    }
}

/// Directory double over a fixed account list.
pub struct StubUserRepository {
    /// Directory contents.
    pub users: Vec<User>,
}

#[async_trait]
impl UserRepository for StubUserRepository {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users.iter().find(|u| u.id == *user_id).cloned())
    }

    async fn find_credentials_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<UserCredentials>, UserPersistenceError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.users.clone())
    }

    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<UserId>, UserPersistenceError> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.id.clone())
            .collect())
    }
}

/// Ticket workflow double.
#[derive(Default)]
pub struct StubTicketWorkflow {
    /// Canned ticket returned by reads; defaults to a fresh one per call
    /// when unset.
    pub ticket: Option<Ticket>,
    /// Failure injected into `apply_action`.
    pub apply_error: Option<Error>,
    /// Approvals returned by `get`.
    pub approvals: Vec<Approval>,
}

impl StubTicketWorkflow {
    fn ticket_for(&self, actor: &ActorId) -> Ticket {
        self.ticket.clone().unwrap_or_else(|| canned_ticket(actor))
    }
}

#[async_trait]
impl TicketWorkflow for StubTicketWorkflow {
    async fn create(&self, actor: &ActorId, new: NewTicket) -> Result<Ticket, Error> {
        let mut ticket = self.ticket_for(actor);
        ticket.item = new.item;
        ticket.reviewers = new.reviewers;
        ticket.shared_with = new.shared_with;
        ticket.created_by = actor.clone();
        ticket.status = TicketStatus::ForCanvass;
        Ok(ticket)
    }

    async fn list(
        &self,
        actor: &ActorId,
        _request: TicketListRequest,
    ) -> Result<Page<Ticket>, Error> {
        Ok(Page::complete(vec![self.ticket_for(actor)]))
    }

    async fn get(&self, actor: &ActorId, _ticket_id: Uuid) -> Result<TicketDetail, Error> {
        Ok(TicketDetail {
            ticket: self.ticket_for(actor),
            approvals: self.approvals.clone(),
            forms: Vec::new(),
        })
    }

    async fn apply_action(
        &self,
        actor: &ActorId,
        _ticket_id: Uuid,
        action: TicketAction,
        _note: Option<String>,
    ) -> Result<Ticket, Error> {
        if let Some(error) = &self.apply_error {
            return Err(error.clone());
        }
        let mut ticket = self.ticket_for(actor);
        ticket.status = action.target();
        Ok(ticket)
    }

    async fn share(
        &self,
        _actor: &ActorId,
        _ticket_id: Uuid,
        users: Vec<UserId>,
    ) -> Result<Vec<UserId>, Error> {
        Ok(users)
    }

    async fn history(
        &self,
        _actor: &ActorId,
        _ticket_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, Error> {
        Ok(Vec::new())
    }
}

/// Review workflow double.
#[derive(Default)]
pub struct StubReviewWorkflow {
    /// Failure injected into `decide`.
    pub decide_error: Option<Error>,
    /// Ticket status reported after a successful decision.
    pub resulting_status: Option<TicketStatus>,
}

#[async_trait]
impl ReviewWorkflow for StubReviewWorkflow {
    async fn list(&self, _actor: &ActorId, _ticket_id: Uuid) -> Result<Vec<Approval>, Error> {
        Ok(Vec::new())
    }

    async fn decide(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
        decision: ReviewDecision,
        _note: Option<String>,
    ) -> Result<ReviewReceipt, Error> {
        if let Some(error) = &self.decide_error {
            return Err(error.clone());
        }
        let status = match decision {
            ReviewDecision::Approve => ApprovalStatus::Approved,
            ReviewDecision::Reject => ApprovalStatus::Rejected,
            ReviewDecision::RequestRevision => ApprovalStatus::AwaitingAction,
        };
        Ok(ReviewReceipt {
            approval: Approval {
                id: Uuid::new_v4(),
                ticket_id,
                reviewer_id: actor.clone(),
                status,
                review_date: Some(Utc::now()),
            },
            ticket_status: self
                .resulting_status
                .unwrap_or(TicketStatus::ForReviewOfSubmissions),
        })
    }
}

/// Draft workflow double with revision-check semantics.
#[derive(Default)]
pub struct StubDraftWorkflow {
    /// When set, `save` fails with a revision conflict naming this actual
    /// revision.
    pub stale_actual: Option<i32>,
}

#[async_trait]
impl DraftWorkflow for StubDraftWorkflow {
    async fn get(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
    ) -> Result<Option<CanvassDraft>, Error> {
        Ok(Some(CanvassDraft::initial(
            ticket_id,
            actor.clone(),
            serde_json::json!({}),
            Utc::now(),
        )))
    }

    async fn save(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
        form: serde_json::Value,
        upload_ids: Vec<Uuid>,
        expected_revision: Option<i32>,
    ) -> Result<CanvassDraft, Error> {
        if let Some(actual) = self.stale_actual {
            return Err(Error::conflict("draft revision mismatch").with_details(
                serde_json::json!({
                    "expectedRevision": expected_revision,
                    "actualRevision": actual,
                    "code": "revision_mismatch",
                }),
            ));
        }
        let mut draft = CanvassDraft::initial(ticket_id, actor.clone(), form, Utc::now());
        draft.revision = expected_revision.map_or(1, |rev| rev + 1);
        draft.upload_ids = upload_ids;
        Ok(draft)
    }

    async fn discard(&self, _actor: &ActorId, _ticket_id: Uuid) -> Result<bool, Error> {
        Ok(true)
    }
}

/// Comment workflow double.
#[derive(Default)]
pub struct StubCommentWorkflow {
    /// Failure injected into `edit` and `remove`.
    pub mutate_error: Option<Error>,
}

#[async_trait]
impl CommentWorkflow for StubCommentWorkflow {
    async fn list(
        &self,
        _actor: &ActorId,
        _ticket_id: Uuid,
        _cursor: Option<String>,
        _limit: Limit,
    ) -> Result<Page<Comment>, Error> {
        Ok(Page::complete(Vec::new()))
    }

    async fn post(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
        body: String,
        reply_to: Option<Uuid>,
    ) -> Result<Comment, Error> {
        Ok(Comment {
            id: Uuid::new_v4(),
            ticket_id,
            author_id: actor.clone(),
            body,
            reply_to,
            edited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    async fn edit(
        &self,
        actor: &ActorId,
        comment_id: Uuid,
        body: String,
    ) -> Result<Comment, Error> {
        if let Some(error) = &self.mutate_error {
            return Err(error.clone());
        }
        Ok(Comment {
            id: comment_id,
            ticket_id: Uuid::new_v4(),
            author_id: actor.clone(),
            body,
            reply_to: None,
            edited: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    async fn remove(&self, _actor: &ActorId, _comment_id: Uuid) -> Result<(), Error> {
        match &self.mutate_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Canvass workflow double.
#[derive(Default)]
pub struct StubCanvassWorkflow {
    /// Failure injected into `submit`.
    pub submit_error: Option<Error>,
}

#[async_trait]
impl CanvassWorkflow for StubCanvassWorkflow {
    async fn register_upload(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
        request: UploadRequest,
    ) -> Result<PendingUpload, Error> {
        let size = i64::try_from(request.bytes.len())
            .map_err(|_| Error::invalid_request("upload too large"))?;
        Ok(PendingUpload {
            id: Uuid::new_v4(),
            ticket_id,
            uploaded_by: actor.clone(),
            kind: request.kind,
            file_name: request.file_name,
            content_type: request.content_type,
            size_bytes: size,
            checksum_hex: "00".repeat(32),
            storage_key: format!("tickets/{ticket_id}/uploads/test"),
            created_at: Utc::now(),
        })
    }

    async fn submit(
        &self,
        actor: &ActorId,
        ticket_id: Uuid,
        form: NewCanvassForm,
        _upload_ids: Vec<Uuid>,
    ) -> Result<CanvassForm, Error> {
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        Ok(CanvassForm {
            id: Uuid::new_v4(),
            ticket_id,
            submitted_by: actor.clone(),
            supplier_name: form.supplier_name,
            rf_date_received: form.rf_date_received,
            lead_time_days: form.lead_time_days,
            payment_terms: form.payment_terms,
            total_amount_cents: form.total_amount_cents,
            created_at: Utc::now(),
            attachments: Vec::new(),
        })
    }

    async fn open_attachment(
        &self,
        _actor: &ActorId,
        _attachment_id: Uuid,
    ) -> Result<AttachmentDownload, Error> {
        Err(Error::not_found("attachment not found"))
    }

    async fn sweep_orphan_uploads(
        &self,
        _actor: &ActorId,
        _older_than: chrono::DateTime<Utc>,
    ) -> Result<u64, Error> {
        Ok(0)
    }
}

/// Notification feed double: empty feed, zero unread.
#[derive(Default)]
pub struct StubNotificationFeed;

#[async_trait]
impl NotificationFeed for StubNotificationFeed {
    async fn list(
        &self,
        _actor: &ActorId,
        _cursor: Option<String>,
        _limit: Limit,
    ) -> Result<NotificationFeedPage, Error> {
        Ok(NotificationFeedPage {
            page: Page::complete(Vec::new()),
            unread: 0,
        })
    }

    async fn mark_read(&self, _actor: &ActorId, _notification_id: Uuid) -> Result<(), Error> {
        Ok(())
    }

    async fn mark_all_read(&self, _actor: &ActorId) -> Result<i64, Error> {
        Ok(0)
    }
}

/// Dashboard double with a fixed summary.
#[derive(Default)]
pub struct StubDashboardQuery;

#[async_trait]
impl DashboardQuery for StubDashboardQuery {
    async fn summary(
        &self,
        _viewer: &UserId,
        _role: Role,
    ) -> Result<DashboardSummary, DashboardQueryError> {
        Ok(DashboardSummary {
            status_counts: vec![],
            awaiting_my_action: 2,
            unread_notifications: 1,
        })
    }
}

/// Upload kind helper used by raw-body upload tests.
#[must_use]
pub fn quotation_kind() -> AttachmentKind {
    AttachmentKind::Quotation
}
