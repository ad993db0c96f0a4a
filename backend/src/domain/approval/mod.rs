//! Reviewer approvals: per-(ticket, reviewer) sign-off records gating
//! ticket progression.

mod service;
#[cfg(test)]
mod service_tests;

pub use service::ReviewService;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Lifecycle of a single reviewer's sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ApprovalStatus {
    /// Assigned, but the ticket has not reached review yet.
    #[serde(rename = "PENDING")]
    Pending,
    /// The ticket is in review and this reviewer has not decided.
    #[serde(rename = "AWAITING ACTION")]
    AwaitingAction,
    /// Reviewer approved the submission.
    #[serde(rename = "APPROVED")]
    Approved,
    /// Reviewer rejected the submission.
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl ApprovalStatus {
    /// Stable database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::AwaitingAction => "AWAITING ACTION",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse the stable representation produced by
    /// [`ApprovalStatus::as_str`].
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "AWAITING ACTION" => Some(Self::AwaitingAction),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether the reviewer has already made a final call.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's sign-off record for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    /// Record identifier.
    pub id: Uuid,
    /// Ticket under review.
    pub ticket_id: Uuid,
    /// Assigned reviewer.
    pub reviewer_id: UserId,
    /// Current sign-off state.
    pub status: ApprovalStatus,
    /// When the reviewer decided, if they have.
    pub review_date: Option<DateTime<Utc>>,
}

/// A reviewer's decision on a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Sign off on the submission.
    Approve,
    /// Send the ticket back to the purchaser for changes.
    RequestRevision,
    /// Reject the submission outright; the ticket terminates.
    Reject,
}

impl ReviewDecision {
    /// Short verb used in history rows and notification messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Approve => "approved the submission",
            Self::RequestRevision => "requested a revision",
            Self::Reject => "rejected the submission",
        }
    }
}

/// Outcome of folding one decision into a ticket's reviewer set.
///
/// Computed from the post-decision approval rows; the persistence layer
/// applies the corresponding status change with a compare-and-set write so
/// concurrent reviewers cannot both fire the completion side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// More reviewers still need to act.
    AwaitingOthers,
    /// Every assigned reviewer has approved.
    AllApproved,
    /// The deciding reviewer asked for changes.
    RevisionRequested,
    /// The deciding reviewer rejected the submission.
    Rejected,
}

/// Fold a fresh decision and the full approval set into an outcome.
///
/// `approvals` must already reflect the decision being evaluated.
#[must_use]
pub fn review_outcome(decision: ReviewDecision, approvals: &[Approval]) -> ReviewOutcome {
    match decision {
        ReviewDecision::RequestRevision => ReviewOutcome::RevisionRequested,
        ReviewDecision::Reject => ReviewOutcome::Rejected,
        ReviewDecision::Approve => {
            if approvals
                .iter()
                .all(|approval| approval.status == ApprovalStatus::Approved)
            {
                ReviewOutcome::AllApproved
            } else {
                ReviewOutcome::AwaitingOthers
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Aggregation-rule coverage.
    use rstest::rstest;

    use super::*;

    fn approval(status: ApprovalStatus) -> Approval {
        Approval {
            id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            reviewer_id: UserId::random(),
            status,
            review_date: status.is_decided().then(Utc::now),
        }
    }

    #[rstest]
    fn approve_with_outstanding_reviewers_awaits_others() {
        let approvals = vec![
            approval(ApprovalStatus::Approved),
            approval(ApprovalStatus::AwaitingAction),
        ];
        assert_eq!(
            review_outcome(ReviewDecision::Approve, &approvals),
            ReviewOutcome::AwaitingOthers
        );
    }

    #[rstest]
    fn approve_completing_the_set_reports_all_approved() {
        let approvals = vec![
            approval(ApprovalStatus::Approved),
            approval(ApprovalStatus::Approved),
        ];
        assert_eq!(
            review_outcome(ReviewDecision::Approve, &approvals),
            ReviewOutcome::AllApproved
        );
    }

    #[rstest]
    #[case(ReviewDecision::RequestRevision, ReviewOutcome::RevisionRequested)]
    #[case(ReviewDecision::Reject, ReviewOutcome::Rejected)]
    fn non_approvals_decide_immediately(
        #[case] decision: ReviewDecision,
        #[case] outcome: ReviewOutcome,
    ) {
        let approvals = vec![approval(ApprovalStatus::Approved)];
        assert_eq!(review_outcome(decision, &approvals), outcome);
    }

    #[rstest]
    fn approval_statuses_round_trip_their_wire_form() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::AwaitingAction,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(ApprovalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApprovalStatus::parse("MAYBE"), None);
    }
}
