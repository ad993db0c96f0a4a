//! Behavioural coverage for [`ReviewService`], including the
//! single-winner guarantee around the final approval.

use std::sync::Arc;

use chrono::Utc;
use mockable::DefaultClock;
use rstest::rstest;
use uuid::Uuid;

use crate::domain::error::ErrorCode;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    MockApprovalRepository, MockNotificationPublisher, MockNotificationRepository,
    MockTicketRepository, MockUserRepository, ReviewWorkflow, TransitionOutcome,
};
use crate::domain::ticket::{ItemDetails, Ticket, TicketName, TicketStatus};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserId};

use super::{Approval, ApprovalStatus, ReviewDecision, ReviewService};

fn profile(id: &UserId, role: Role) -> User {
    User::new(
        id.clone(),
        DisplayName::new("Reviewer One").expect("valid name"),
        EmailAddress::new("reviewer@corp.example").expect("valid email"),
        role,
    )
}

fn ticket_in_review(creator: &UserId, reviewers: &[UserId]) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        name: TicketName::compose(7, Utc::now().date_naive()),
        item: ItemDetails::new("widget", "", 1, None).expect("valid item"),
        status: TicketStatus::ForReviewOfSubmissions,
        created_by: creator.clone(),
        is_revised: false,
        reviewers: reviewers.to_vec(),
        shared_with: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn approval(ticket_id: Uuid, reviewer: &UserId, status: ApprovalStatus) -> Approval {
    Approval {
        id: Uuid::new_v4(),
        ticket_id,
        reviewer_id: reviewer.clone(),
        status,
        review_date: status.is_decided().then(Utc::now),
    }
}

struct Mocks {
    tickets: MockTicketRepository,
    approvals: MockApprovalRepository,
    users: MockUserRepository,
    notifications: MockNotificationRepository,
}

impl Mocks {
    fn for_reviewer(actor: &UserId, ticket: &Ticket) -> Self {
        let actor_profile = profile(actor, Role::Reviewer);
        let found = ticket.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(actor_profile.clone())));
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find()
            .returning(move |_| Ok(Some(found.clone())));
        Self {
            tickets,
            approvals: MockApprovalRepository::new(),
            users,
            notifications: MockNotificationRepository::new(),
        }
    }

    fn into_service(self) -> ReviewService {
        let notifier = Arc::new(NotificationService::new(
            Arc::new(self.notifications),
            Arc::new(MockNotificationPublisher::new()),
            Arc::new(DefaultClock),
        ));
        ReviewService::new(
            Arc::new(self.tickets),
            Arc::new(self.approvals),
            Arc::new(self.users),
            notifier,
            Arc::new(DefaultClock),
        )
    }
}

#[rstest]
#[tokio::test]
async fn a_non_final_approval_leaves_the_ticket_in_review() {
    let actor = UserId::random();
    let other = UserId::random();
    let ticket = ticket_in_review(&UserId::random(), &[actor.clone(), other.clone()]);
    let ticket_id = ticket.id;

    let mut mocks = Mocks::for_reviewer(&actor, &ticket);
    let set = vec![
        approval(ticket_id, &actor, ApprovalStatus::Approved),
        approval(ticket_id, &other, ApprovalStatus::AwaitingAction),
    ];
    mocks
        .approvals
        .expect_record_decision()
        .return_once(move |_, _, _, _| Ok(set));
    mocks.tickets.expect_transition().never();

    let receipt = mocks
        .into_service()
        .decide(&actor, ticket_id, ReviewDecision::Approve, None)
        .await
        .expect("decision records");
    assert_eq!(receipt.ticket_status, TicketStatus::ForReviewOfSubmissions);
    assert_eq!(receipt.approval.status, ApprovalStatus::Approved);
}

#[rstest]
#[tokio::test]
async fn the_final_approval_advances_the_ticket_and_notifies_managers() {
    let actor = UserId::random();
    let manager = UserId::random();
    let creator = UserId::random();
    let ticket = ticket_in_review(&creator, &[actor.clone()]);
    let ticket_id = ticket.id;

    let mut mocks = Mocks::for_reviewer(&actor, &ticket);
    let set = vec![approval(ticket_id, &actor, ApprovalStatus::Approved)];
    mocks
        .approvals
        .expect_record_decision()
        .return_once(move |_, _, _, _| Ok(set));
    mocks
        .tickets
        .expect_transition()
        .withf(move |request| {
            request.expected == TicketStatus::ForReviewOfSubmissions
                && request.next == TicketStatus::ForApproval
        })
        .return_once(|_| Ok(TransitionOutcome::Applied));
    let manager_for_lookup = manager.clone();
    mocks
        .users
        .expect_list_ids_by_role()
        .return_once(move |_| Ok(vec![manager_for_lookup]));
    mocks
        .notifications
        .expect_insert_many()
        .withf(move |batch, _| {
            batch.iter().any(|n| n.user_id == manager)
                && batch.iter().any(|n| n.user_id == creator)
        })
        .return_once(|_, _| Ok(Vec::new()));

    let receipt = mocks
        .into_service()
        .decide(&actor, ticket_id, ReviewDecision::Approve, None)
        .await
        .expect("decision records");
    assert_eq!(receipt.ticket_status, TicketStatus::ForApproval);
}

#[rstest]
#[tokio::test]
async fn losing_the_final_approval_race_skips_the_side_effects() {
    let actor = UserId::random();
    let ticket = ticket_in_review(&UserId::random(), &[actor.clone()]);
    let ticket_id = ticket.id;

    let mut mocks = Mocks::for_reviewer(&actor, &ticket);
    let set = vec![approval(ticket_id, &actor, ApprovalStatus::Approved)];
    mocks
        .approvals
        .expect_record_decision()
        .return_once(move |_, _, _, _| Ok(set));
    mocks.tickets.expect_transition().return_once(|_| {
        Ok(TransitionOutcome::Lost {
            actual: TicketStatus::ForApproval,
        })
    });
    // The loser must not notify anyone.
    mocks.notifications.expect_insert_many().never();

    let receipt = mocks
        .into_service()
        .decide(&actor, ticket_id, ReviewDecision::Approve, None)
        .await
        .expect("decision records");
    assert_eq!(receipt.ticket_status, TicketStatus::ForApproval);
}

#[rstest]
#[tokio::test]
async fn deciding_outside_review_is_a_conflict() {
    let actor = UserId::random();
    let mut ticket = ticket_in_review(&UserId::random(), &[actor.clone()]);
    ticket.status = TicketStatus::WorkInProgress;

    let mocks = Mocks::for_reviewer(&actor, &ticket);
    let error = mocks
        .into_service()
        .decide(&actor, ticket.id, ReviewDecision::Approve, None)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn non_reviewers_cannot_decide() {
    let actor = UserId::random();
    let reviewer = UserId::random();
    let mut ticket = ticket_in_review(&UserId::random(), &[reviewer]);
    // Visible to the actor, but not one of its reviewers.
    ticket.shared_with.push(actor.clone());

    let mocks = Mocks::for_reviewer(&actor, &ticket);
    let error = mocks
        .into_service()
        .decide(&actor, ticket.id, ReviewDecision::Approve, None)
        .await
        .expect_err("must reject");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn revision_requests_move_the_ticket_without_consuming_the_approval() {
    let actor = UserId::random();
    let creator = UserId::random();
    let ticket = ticket_in_review(&creator, &[actor.clone()]);
    let ticket_id = ticket.id;

    let mut mocks = Mocks::for_reviewer(&actor, &ticket);
    let own = approval(ticket_id, &actor, ApprovalStatus::AwaitingAction);
    mocks
        .approvals
        .expect_find()
        .return_once(move |_, _| Ok(Some(own)));
    mocks.approvals.expect_record_decision().never();
    mocks
        .tickets
        .expect_transition()
        .withf(|request| request.next == TicketStatus::ForRevision)
        .return_once(|_| Ok(TransitionOutcome::Applied));
    mocks
        .notifications
        .expect_insert_many()
        .return_once(|_, _| Ok(Vec::new()));

    let receipt = mocks
        .into_service()
        .decide(&actor, ticket_id, ReviewDecision::RequestRevision, None)
        .await
        .expect("decision records");
    assert_eq!(receipt.ticket_status, TicketStatus::ForRevision);
    assert_eq!(receipt.approval.status, ApprovalStatus::AwaitingAction);
}
