//! Behavioural coverage for [`CanvassService`].

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use uuid::Uuid;

use crate::domain::canvass::{AttachmentKind, NewCanvassForm, PendingUpload};
use crate::domain::error::ErrorCode;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    AttachmentStore, CanvassRepositoryError, CanvassWorkflow, MemoryAttachmentStore,
    MockCanvassRepository,
    MockNotificationPublisher, MockNotificationRepository, MockTicketRepository,
    MockUserRepository, UploadRequest,
};
use crate::domain::ticket::{ItemDetails, Ticket, TicketName, TicketStatus};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserId};

use super::CanvassService;

fn profile(id: &UserId, role: Role) -> User {
    User::new(
        id.clone(),
        DisplayName::new("Pat Purchaser").expect("valid name"),
        EmailAddress::new("pat@corp.example").expect("valid email"),
        role,
    )
}

fn ticket(created_by: &UserId, status: TicketStatus) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        name: TicketName::compose(3, Utc::now().date_naive()),
        item: ItemDetails::new("widget", "", 2, None).expect("valid item"),
        status,
        created_by: created_by.clone(),
        is_revised: false,
        reviewers: vec![UserId::random()],
        shared_with: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

struct Harness {
    canvass: MockCanvassRepository,
    tickets: MockTicketRepository,
    users: MockUserRepository,
    notifications: MockNotificationRepository,
    store: Arc<MemoryAttachmentStore>,
}

impl Harness {
    fn new(actor: &UserId, role: Role, found: &Ticket) -> Self {
        let actor_profile = profile(actor, role);
        let found = found.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(actor_profile.clone())));
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find()
            .returning(move |_| Ok(Some(found.clone())));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert_many()
            .returning(|_, _| Ok(Vec::new()));
        Self {
            canvass: MockCanvassRepository::new(),
            tickets,
            users,
            notifications,
            store: Arc::new(MemoryAttachmentStore::new()),
        }
    }

    fn into_service(self) -> (CanvassService, Arc<MemoryAttachmentStore>) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::new(NotificationService::new(
            Arc::new(self.notifications),
            Arc::new(MockNotificationPublisher::new()),
            Arc::new(DefaultClock),
        ));
        let service = CanvassService::new(
            Arc::new(self.canvass),
            Arc::new(self.tickets),
            Arc::new(self.users),
            self.store,
            notifier,
            Arc::new(DefaultClock),
        );
        (service, store)
    }
}

fn upload_request(kind: AttachmentKind) -> UploadRequest {
    UploadRequest {
        kind,
        file_name: "quote.pdf".to_owned(),
        content_type: "application/pdf".to_owned(),
        bytes: vec![1, 2, 3, 4],
    }
}

fn pending(ticket_id: Uuid, actor: &UserId, kind: AttachmentKind) -> PendingUpload {
    PendingUpload {
        id: Uuid::new_v4(),
        ticket_id,
        uploaded_by: actor.clone(),
        kind,
        file_name: "quote.pdf".to_owned(),
        content_type: "application/pdf".to_owned(),
        size_bytes: 4,
        checksum_hex: "00".repeat(32),
        storage_key: format!("tickets/{ticket_id}/uploads/{}", Uuid::new_v4()),
        created_at: Utc::now(),
    }
}

fn form_fields() -> NewCanvassForm {
    NewCanvassForm::new(
        "Acme Industrial",
        NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
        14,
        "NET 30",
        125_000,
    )
    .expect("valid form")
}

#[rstest]
#[tokio::test]
async fn uploads_store_the_blob_and_register_the_row() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let mut harness = Harness::new(&actor, Role::Purchaser, &existing);
    harness
        .canvass
        .expect_register_upload()
        .return_once(|_| Ok(()));

    let (service, store) = harness.into_service();
    let upload = service
        .register_upload(&actor, ticket_id, upload_request(AttachmentKind::Quotation))
        .await
        .expect("upload registers");

    assert_eq!(upload.size_bytes, 4);
    assert_eq!(upload.checksum_hex.len(), 64);
    assert!(upload.storage_key.starts_with(&format!("tickets/{ticket_id}/uploads/")));
    assert_eq!(store.len(), 1);
}

#[rstest]
#[tokio::test]
async fn a_failed_row_insert_reclaims_the_blob() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let mut harness = Harness::new(&actor, Role::Purchaser, &existing);
    harness
        .canvass
        .expect_register_upload()
        .return_once(|_| Err(CanvassRepositoryError::query("insert failed")));

    let (service, store) = harness.into_service();
    let error = service
        .register_upload(&actor, ticket_id, upload_request(AttachmentKind::Quotation))
        .await
        .expect_err("must fail");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert!(store.is_empty(), "blob must not be left orphaned");
}

#[rstest]
#[tokio::test]
async fn uploads_outside_work_in_progress_are_conflicts() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::ForReviewOfSubmissions);

    let harness = Harness::new(&actor, Role::Purchaser, &existing);
    let (service, store) = harness.into_service();
    let error = service
        .register_upload(&actor, existing.id, upload_request(AttachmentKind::Quotation))
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert!(store.is_empty());
}

#[rstest]
#[tokio::test]
async fn reviewers_cannot_upload() {
    let actor = UserId::random();
    let mut existing = ticket(&UserId::random(), TicketStatus::WorkInProgress);
    existing.reviewers = vec![actor.clone()];

    let harness = Harness::new(&actor, Role::Reviewer, &existing);
    let (service, _store) = harness.into_service();
    let error = service
        .register_upload(&actor, existing.id, upload_request(AttachmentKind::Quotation))
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn submission_resolves_uploads_and_commits_atomically() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let sheet = pending(ticket_id, &actor, AttachmentKind::CanvassSheet);
    let quote = pending(ticket_id, &actor, AttachmentKind::Quotation);
    let upload_ids = vec![sheet.id, quote.id];
    let resolved = vec![sheet, quote];

    let mut harness = Harness::new(&actor, Role::Purchaser, &existing);
    harness
        .canvass
        .expect_resolve_uploads()
        .return_once(move |_, _, _| Ok(resolved));
    harness
        .canvass
        .expect_submit()
        .withf(move |form, ids, expected| {
            form.ticket_id == ticket_id
                && form.attachments.len() == 2
                && ids.len() == 2
                && *expected == TicketStatus::WorkInProgress
        })
        .return_once(|_, _, _| Ok(()));

    let (service, _store) = harness.into_service();
    let stored = service
        .submit(&actor, ticket_id, form_fields(), upload_ids)
        .await
        .expect("submission commits");
    assert_eq!(stored.supplier_name, "Acme Industrial");
    assert_eq!(stored.attachments.len(), 2);
}

#[rstest]
#[tokio::test]
async fn submission_without_a_sheet_is_rejected_before_any_write() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let quote = pending(ticket_id, &actor, AttachmentKind::Quotation);
    let upload_ids = vec![quote.id];
    let resolved = vec![quote];

    let mut harness = Harness::new(&actor, Role::Purchaser, &existing);
    harness
        .canvass
        .expect_resolve_uploads()
        .return_once(move |_, _, _| Ok(resolved));
    harness.canvass.expect_submit().never();

    let (service, _store) = harness.into_service();
    let error = service
        .submit(&actor, ticket_id, form_fields(), upload_ids)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn a_lost_submission_race_maps_to_conflict() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let sheet = pending(ticket_id, &actor, AttachmentKind::CanvassSheet);
    let quote = pending(ticket_id, &actor, AttachmentKind::Quotation);
    let upload_ids = vec![sheet.id, quote.id];
    let resolved = vec![sheet, quote];

    let mut harness = Harness::new(&actor, Role::Purchaser, &existing);
    harness
        .canvass
        .expect_resolve_uploads()
        .return_once(move |_, _, _| Ok(resolved));
    harness.canvass.expect_submit().return_once(|_, _, _| {
        Err(CanvassRepositoryError::status_conflict(
            "WORK IN PROGRESS",
            "CANCELED",
        ))
    });

    let (service, _store) = harness.into_service();
    let error = service
        .submit(&actor, ticket_id, form_fields(), upload_ids)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn the_sweep_reclaims_blobs_and_rows() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);
    let ticket_id = existing.id;

    let stale_a = pending(ticket_id, &actor, AttachmentKind::Quotation);
    let stale_b = pending(ticket_id, &actor, AttachmentKind::Quotation);
    let key_a = stale_a.storage_key.clone();
    let stale = vec![stale_a, stale_b];

    let mut harness = Harness::new(&actor, Role::Admin, &existing);
    harness
        .canvass
        .expect_stale_uploads()
        .return_once(move |_| Ok(stale));
    harness
        .canvass
        .expect_delete_upload()
        .times(2)
        .returning(|_| Ok(true));

    let (service, store) = harness.into_service();
    store.put(&key_a, vec![9]).await.expect("seed blob");

    let reclaimed = service
        .sweep_orphan_uploads(&actor, Utc::now() - Duration::hours(24))
        .await
        .expect("sweep runs");
    assert_eq!(reclaimed, 2);
    assert!(store.is_empty());
}

#[rstest]
#[tokio::test]
async fn the_sweep_is_admin_only() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::WorkInProgress);

    let harness = Harness::new(&actor, Role::Purchaser, &existing);
    let (service, _store) = harness.into_service();
    let error = service
        .sweep_orphan_uploads(&actor, Utc::now())
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}
