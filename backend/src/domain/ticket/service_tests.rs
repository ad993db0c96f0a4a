//! Behavioural coverage for [`TicketWorkflowService`].

use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use rstest::rstest;
use uuid::Uuid;

use crate::domain::error::ErrorCode;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    MockApprovalRepository, MockCanvassRepository, MockNotificationPublisher,
    MockNotificationRepository, MockTicketRepository, MockUserRepository, TicketWorkflow,
    TransitionOutcome,
};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserId};

use super::{ItemDetails, NewTicket, Ticket, TicketAction, TicketName, TicketStatus};

struct Mocks {
    tickets: MockTicketRepository,
    approvals: MockApprovalRepository,
    canvass: MockCanvassRepository,
    users: MockUserRepository,
    notifications: MockNotificationRepository,
    publisher: MockNotificationPublisher,
}

impl Default for Mocks {
    fn default() -> Self {
        let mut notifications = MockNotificationRepository::new();
        // Fan-out is best effort; most tests don't assert on it.
        notifications
            .expect_insert_many()
            .returning(|_, _| Ok(Vec::new()));
        Self {
            tickets: MockTicketRepository::new(),
            approvals: MockApprovalRepository::new(),
            canvass: MockCanvassRepository::new(),
            users: MockUserRepository::new(),
            notifications,
            publisher: MockNotificationPublisher::new(),
        }
    }
}

impl Mocks {
    fn into_service(self) -> super::TicketWorkflowService {
        let notifier = Arc::new(NotificationService::new(
            Arc::new(self.notifications),
            Arc::new(self.publisher),
            Arc::new(DefaultClock),
        ));
        super::TicketWorkflowService::new(
            Arc::new(self.tickets),
            Arc::new(self.approvals),
            Arc::new(self.canvass),
            Arc::new(self.users),
            notifier,
            Arc::new(DefaultClock),
        )
    }
}

fn user(id: &UserId, role: Role) -> User {
    User::new(
        id.clone(),
        DisplayName::new("Test User").expect("valid name"),
        EmailAddress::new("user@corp.example").expect("valid email"),
        role,
    )
}

fn ticket(created_by: &UserId, status: TicketStatus) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        name: TicketName::compose(1, Utc::now().date_naive()),
        item: ItemDetails::new("widget", "a widget", 1, None).expect("valid item"),
        status,
        created_by: created_by.clone(),
        is_revised: false,
        reviewers: vec![UserId::random()],
        shared_with: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn expect_actor(mocks: &mut Mocks, actor: &UserId, role: Role) {
    let profile = user(actor, role);
    mocks
        .users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(profile.clone())));
}

fn expect_ticket(mocks: &mut Mocks, found: &Ticket) {
    let found = found.clone();
    mocks
        .tickets
        .expect_find()
        .returning(move |_| Ok(Some(found.clone())));
}

#[rstest]
#[tokio::test]
async fn start_canvass_applies_the_cas_transition() {
    let actor = UserId::random();
    let creator = UserId::random();
    let existing = ticket(&creator, TicketStatus::ForCanvass);
    let ticket_id = existing.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Purchaser);
    expect_ticket(&mut mocks, &existing);
    mocks
        .tickets
        .expect_transition()
        .withf(move |request| {
            request.ticket_id == ticket_id
                && request.expected == TicketStatus::ForCanvass
                && request.next == TicketStatus::WorkInProgress
                && !request.mark_revised
                && !request.reset_approvals
        })
        .return_once(|_| Ok(TransitionOutcome::Applied));

    let updated = mocks
        .into_service()
        .apply_action(&actor, ticket_id, TicketAction::StartCanvass, None)
        .await
        .expect("action applies");
    assert_eq!(updated.status, TicketStatus::WorkInProgress);
}

#[rstest]
#[tokio::test]
async fn illegal_transitions_are_conflicts_and_never_reach_the_store() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::ForCanvass);
    let ticket_id = existing.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Manager);
    expect_ticket(&mut mocks, &existing);
    mocks.tickets.expect_transition().never();

    let error = mocks
        .into_service()
        .apply_action(&actor, ticket_id, TicketAction::Approve, None)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert!(error.message().contains("illegal transition"));
}

#[rstest]
#[tokio::test]
async fn unauthorised_roles_are_forbidden() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::ForApproval);
    let ticket_id = existing.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Reviewer);
    expect_ticket(&mut mocks, &existing);
    mocks.tickets.expect_transition().never();

    let error = mocks
        .into_service()
        .apply_action(&actor, ticket_id, TicketAction::Approve, None)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn losing_the_status_race_is_a_conflict() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::ForApproval);
    let ticket_id = existing.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Manager);
    expect_ticket(&mut mocks, &existing);
    mocks.tickets.expect_transition().return_once(|_| {
        Ok(TransitionOutcome::Lost {
            actual: TicketStatus::Canceled,
        })
    });

    let error = mocks
        .into_service()
        .apply_action(&actor, ticket_id, TicketAction::Approve, None)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Conflict);
    let details = error.details().expect("details present");
    assert_eq!(details["actual"], "CANCELED");
}

#[rstest]
#[tokio::test]
async fn resubmission_marks_revised_and_resets_approvals() {
    let actor = UserId::random();
    let existing = ticket(&actor, TicketStatus::ForRevision);
    let ticket_id = existing.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Purchaser);
    expect_ticket(&mut mocks, &existing);
    mocks
        .tickets
        .expect_transition()
        .withf(|request| request.mark_revised && request.reset_approvals)
        .return_once(|_| Ok(TransitionOutcome::Applied));

    let updated = mocks
        .into_service()
        .apply_action(&actor, ticket_id, TicketAction::Resubmit, None)
        .await
        .expect("action applies");
    assert!(updated.is_revised);
    assert_eq!(updated.status, TicketStatus::WorkInProgress);
}

#[rstest]
#[tokio::test]
async fn creation_rejects_reviewers_without_the_reviewer_role() {
    let actor = UserId::random();
    let impostor = UserId::random();

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Purchaser);
    mocks
        .users
        .expect_list_ids_by_role()
        .return_once(|_| Ok(Vec::new()));
    mocks.tickets.expect_create().never();

    let new = NewTicket::new(
        ItemDetails::new("widget", "", 1, None).expect("valid item"),
        vec![impostor],
        Vec::new(),
    )
    .expect("valid request");

    let error = mocks
        .into_service()
        .create(&actor, new)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn sharing_requires_creator_or_admin() {
    let actor = UserId::random();
    let creator = UserId::random();
    let existing = ticket(&creator, TicketStatus::ForCanvass);
    // Make the ticket visible to the actor without making them creator.
    let mut visible = existing.clone();
    visible.shared_with.push(actor.clone());
    let ticket_id = visible.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Purchaser);
    expect_ticket(&mut mocks, &visible);
    mocks.tickets.expect_share().never();

    let error = mocks
        .into_service()
        .share(&actor, ticket_id, vec![UserId::random()])
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn outsiders_cannot_observe_ticket_existence() {
    let actor = UserId::random();
    let creator = UserId::random();
    let hidden = ticket(&creator, TicketStatus::ForCanvass);
    let ticket_id = hidden.id;

    let mut mocks = Mocks::default();
    expect_actor(&mut mocks, &actor, Role::Purchaser);
    expect_ticket(&mut mocks, &hidden);

    let error = mocks
        .into_service()
        .history(&actor, ticket_id)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
