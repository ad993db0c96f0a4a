//! Ticket aggregate: procurement requests routed through canvass, review,
//! and approval.
//!
//! The status state machine is the contract the rest of the workflow hangs
//! off. Transitions are table-driven and validated here; persistence applies
//! them with compare-and-set writes so a lost race surfaces as a conflict
//! instead of silently overwriting another actor's transition.

mod service;
#[cfg(test)]
mod service_tests;

pub use service::TicketWorkflowService;
pub(crate) use service::{map_ticket_error, map_user_error};

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{Role, UserId};

/// Validation errors raised by ticket value objects and requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketValidationError {
    /// Item name was empty after trimming.
    EmptyItemName,
    /// Item name exceeded [`ITEM_NAME_MAX`] characters.
    ItemNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Item description exceeded [`ITEM_DESCRIPTION_MAX`] characters.
    DescriptionTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Quantity was zero or negative.
    NonPositiveQuantity,
    /// No reviewers were assigned.
    NoReviewers,
    /// The same reviewer was listed twice.
    DuplicateReviewer,
    /// Ticket name did not match the `PT-NNNN-MMDDYY` pattern.
    MalformedName,
    /// Status string did not name a known status.
    UnknownStatus {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for TicketValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyItemName => write!(f, "item name must not be empty"),
            Self::ItemNameTooLong { max } => {
                write!(f, "item name must be at most {max} characters")
            }
            Self::DescriptionTooLong { max } => {
                write!(f, "item description must be at most {max} characters")
            }
            Self::NonPositiveQuantity => write!(f, "quantity must be positive"),
            Self::NoReviewers => write!(f, "at least one reviewer must be assigned"),
            Self::DuplicateReviewer => write!(f, "reviewers must be distinct"),
            Self::MalformedName => write!(f, "ticket name must match PT-NNNN-MMDDYY"),
            Self::UnknownStatus { value } => write!(f, "unknown ticket status: {value}"),
        }
    }
}

impl std::error::Error for TicketValidationError {}

/// Workflow position of a ticket.
///
/// Wire and database representation keeps the original system's
/// space-separated uppercase literals so existing dashboards and exports
/// keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TicketStatus {
    /// Freshly created, waiting for a purchaser to start canvassing.
    #[serde(rename = "FOR CANVASS")]
    ForCanvass,
    /// A purchaser is gathering supplier quotes.
    #[serde(rename = "WORK IN PROGRESS")]
    WorkInProgress,
    /// A canvass form was submitted; reviewers are signing off.
    #[serde(rename = "FOR REVIEW OF SUBMISSIONS")]
    ForReviewOfSubmissions,
    /// All reviewers approved; awaiting manager sign-off.
    #[serde(rename = "FOR APPROVAL")]
    ForApproval,
    /// Manager approved. Terminal.
    #[serde(rename = "DONE")]
    Done,
    /// A reviewer requested changes; back to the purchaser.
    #[serde(rename = "FOR REVISION")]
    ForRevision,
    /// Withdrawn by its creator or an admin. Terminal.
    #[serde(rename = "CANCELED")]
    Canceled,
    /// Manager declined at final sign-off. Terminal.
    #[serde(rename = "DECLINED")]
    Declined,
    /// A reviewer rejected the submission outright. Terminal.
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl TicketStatus {
    /// Stable database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForCanvass => "FOR CANVASS",
            Self::WorkInProgress => "WORK IN PROGRESS",
            Self::ForReviewOfSubmissions => "FOR REVIEW OF SUBMISSIONS",
            Self::ForApproval => "FOR APPROVAL",
            Self::Done => "DONE",
            Self::ForRevision => "FOR REVISION",
            Self::Canceled => "CANCELED",
            Self::Declined => "DECLINED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse the stable representation produced by [`TicketStatus::as_str`].
    pub fn parse(value: &str) -> Result<Self, TicketValidationError> {
        match value {
            "FOR CANVASS" => Ok(Self::ForCanvass),
            "WORK IN PROGRESS" => Ok(Self::WorkInProgress),
            "FOR REVIEW OF SUBMISSIONS" => Ok(Self::ForReviewOfSubmissions),
            "FOR APPROVAL" => Ok(Self::ForApproval),
            "DONE" => Ok(Self::Done),
            "FOR REVISION" => Ok(Self::ForRevision),
            "CANCELED" => Ok(Self::Canceled),
            "DECLINED" => Ok(Self::Declined),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(TicketValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }

    /// Whether the workflow ends here.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Canceled | Self::Declined | Self::Rejected)
    }

    /// Whether moving to `next` is a legal workflow step.
    ///
    /// This is the single source of truth consulted by every transition
    /// path, including the canvass submission and reviewer decision flows
    /// that do not go through [`TicketAction`].
    #[must_use]
    pub fn permits(self, next: Self) -> bool {
        use TicketStatus as S;
        match (self, next) {
            (S::ForCanvass, S::WorkInProgress)
            | (S::WorkInProgress, S::ForReviewOfSubmissions)
            | (S::ForReviewOfSubmissions, S::ForApproval)
            | (S::ForReviewOfSubmissions, S::ForRevision)
            | (S::ForReviewOfSubmissions, S::Rejected)
            | (S::ForRevision, S::WorkInProgress)
            | (S::ForApproval, S::Done)
            | (S::ForApproval, S::Declined) => true,
            (from, S::Canceled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direct workflow actions a user can take on a ticket.
///
/// Canvass submission and reviewer decisions have their own endpoints with
/// richer payloads; everything else funnels through here. This replaces the
/// original system's untyped `canvassAction(ticket_id, user_id, status)`
/// free-form status overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    /// Purchaser picks up the ticket and starts canvassing.
    StartCanvass,
    /// Purchaser sends a revised ticket back into canvassing.
    Resubmit,
    /// Manager gives final approval.
    Approve,
    /// Manager declines at final sign-off.
    Decline,
    /// Creator or admin withdraws the ticket.
    Cancel,
}

impl TicketAction {
    /// The status an applied action moves the ticket into.
    #[must_use]
    pub const fn target(self) -> TicketStatus {
        match self {
            Self::StartCanvass | Self::Resubmit => TicketStatus::WorkInProgress,
            Self::Approve => TicketStatus::Done,
            Self::Decline => TicketStatus::Declined,
            Self::Cancel => TicketStatus::Canceled,
        }
    }

    /// The statuses an action may be applied from.
    #[must_use]
    pub fn applies_from(self, status: TicketStatus) -> bool {
        match self {
            Self::StartCanvass => status == TicketStatus::ForCanvass,
            Self::Resubmit => status == TicketStatus::ForRevision,
            Self::Approve | Self::Decline => status == TicketStatus::ForApproval,
            Self::Cancel => !status.is_terminal(),
        }
    }

    /// Role/ownership gate for the action.
    #[must_use]
    pub const fn allowed(self, role: Role, is_creator: bool) -> bool {
        match self {
            Self::StartCanvass | Self::Resubmit => {
                matches!(role, Role::Purchaser | Role::Admin)
            }
            Self::Approve | Self::Decline => matches!(role, Role::Manager | Role::Admin),
            Self::Cancel => is_creator || matches!(role, Role::Admin),
        }
    }

    /// Short verb used in history rows and notification messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::StartCanvass => "started canvassing",
            Self::Resubmit => "resubmitted after revision",
            Self::Approve => "approved",
            Self::Decline => "declined",
            Self::Cancel => "canceled",
        }
    }
}

/// Maximum accepted item name length.
pub const ITEM_NAME_MAX: usize = 200;

/// Maximum accepted item description length.
pub const ITEM_DESCRIPTION_MAX: usize = 2000;

/// Sequence-and-date ticket code, e.g. `PT-0042-080626`.
///
/// The sequence restarts daily; allocation happens inside the ticket
/// creation transaction so concurrent creators never share a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "PT-0042-080626")]
pub struct TicketName(String);

impl TicketName {
    /// Compose a name from an allocated sequence number and a calendar date.
    #[must_use]
    pub fn compose(sequence: u32, date: NaiveDate) -> Self {
        Self(format!("PT-{sequence:04}-{}", date.format("%m%d%y")))
    }

    fn validate(value: &str) -> Result<(), TicketValidationError> {
        let mut parts = value.split('-');
        let (Some(prefix), Some(seq), Some(date), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TicketValidationError::MalformedName);
        };
        let seq_ok = seq.len() >= 4 && seq.chars().all(|c| c.is_ascii_digit());
        let date_ok = date.len() == 6 && date.chars().all(|c| c.is_ascii_digit());
        if prefix == "PT" && seq_ok && date_ok {
            Ok(())
        } else {
            Err(TicketValidationError::MalformedName)
        }
    }
}

impl AsRef<str> for TicketName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TicketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<TicketName> for String {
    fn from(value: TicketName) -> Self {
        value.0
    }
}

impl TryFrom<String> for TicketName {
    type Error = TicketValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

/// The item being procured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    /// Short name of the requested item.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Requested quantity.
    pub quantity: i32,
    /// Optional technical specifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,
}

impl ItemDetails {
    /// Validate and construct item details.
    pub fn new(
        name: impl AsRef<str>,
        description: impl AsRef<str>,
        quantity: i32,
        specifications: Option<String>,
    ) -> Result<Self, TicketValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(TicketValidationError::EmptyItemName);
        }
        if name.chars().count() > ITEM_NAME_MAX {
            return Err(TicketValidationError::ItemNameTooLong { max: ITEM_NAME_MAX });
        }
        let description = description.as_ref().trim();
        if description.chars().count() > ITEM_DESCRIPTION_MAX {
            return Err(TicketValidationError::DescriptionTooLong {
                max: ITEM_DESCRIPTION_MAX,
            });
        }
        if quantity <= 0 {
            return Err(TicketValidationError::NonPositiveQuantity);
        }
        Ok(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            quantity,
            specifications: specifications
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
        })
    }
}

/// A procurement ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Stable identifier.
    pub id: Uuid,
    /// Sequence-and-date code shown to users.
    pub name: TicketName,
    /// The requested item.
    pub item: ItemDetails,
    /// Current workflow position.
    pub status: TicketStatus,
    /// User who created the ticket.
    pub created_by: UserId,
    /// Set once the ticket has been resubmitted after a revision request.
    pub is_revised: bool,
    /// Reviewers assigned at creation.
    pub reviewers: Vec<UserId>,
    /// Users the ticket has been shared with.
    pub shared_with: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Whether `user` may see this ticket.
    ///
    /// Admins and managers see everything; others see tickets they created,
    /// review, or have been shared.
    #[must_use]
    pub fn visible_to(&self, user: &UserId, role: Role) -> bool {
        matches!(role, Role::Admin | Role::Manager)
            || self.created_by == *user
            || self.reviewers.contains(user)
            || self.shared_with.contains(user)
    }

    /// Users with a stake in this ticket: creator, reviewers, sharees.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        let mut out = vec![self.created_by.clone()];
        for reviewer in &self.reviewers {
            if !out.contains(reviewer) {
                out.push(reviewer.clone());
            }
        }
        for shared in &self.shared_with {
            if !out.contains(shared) {
                out.push(shared.clone());
            }
        }
        out
    }
}

/// Validated request to create a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// The requested item.
    pub item: ItemDetails,
    /// Distinct, non-empty reviewer set.
    pub reviewers: Vec<UserId>,
    /// Users to share the ticket with at creation.
    pub shared_with: Vec<UserId>,
}

impl NewTicket {
    /// Validate and construct a creation request.
    pub fn new(
        item: ItemDetails,
        reviewers: Vec<UserId>,
        shared_with: Vec<UserId>,
    ) -> Result<Self, TicketValidationError> {
        if reviewers.is_empty() {
            return Err(TicketValidationError::NoReviewers);
        }
        let mut seen: Vec<&UserId> = Vec::with_capacity(reviewers.len());
        for reviewer in &reviewers {
            if seen.contains(&reviewer) {
                return Err(TicketValidationError::DuplicateReviewer);
            }
            seen.push(reviewer);
        }
        Ok(Self {
            item,
            reviewers,
            shared_with,
        })
    }
}

/// One entry in a ticket's status audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Ticket the entry belongs to.
    pub ticket_id: Uuid,
    /// Status the ticket moved into.
    pub status: TicketStatus,
    /// User who caused the transition.
    pub changed_by: UserId,
    /// Optional note (e.g. a manager's decline reason).
    pub note: Option<String>,
    /// When the transition was applied.
    pub created_at: DateTime<Utc>,
}
