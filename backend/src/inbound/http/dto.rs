//! Wire-level response payloads shared by HTTP handlers.
//!
//! Domain types stay transport-agnostic; these DTOs pin the JSON contract
//! (camelCase keys, string ids, RFC 3339 timestamps) and the OpenAPI
//! schemas in one place.

use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::approval::Approval;
use crate::domain::canvass::{CanvassAttachment, CanvassForm};
use crate::domain::comment::Comment;
use crate::domain::dashboard::DashboardSummary;
use crate::domain::draft::CanvassDraft;
use crate::domain::notification::Notification;
use crate::domain::ports::TicketDetail;
use crate::domain::ticket::{StatusHistoryEntry, Ticket, TicketStatus};
use crate::domain::user::User;

/// Directory profile payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Workflow role.
    pub role: String,
    /// Avatar URL, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            display_name: user.display_name.to_string(),
            email: user.email.to_string(),
            role: user.role.to_string(),
            avatar_url: user.avatar_url,
        }
    }
}

/// Ticket payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    /// Ticket id.
    pub id: String,
    /// Sequence-and-date code.
    pub name: String,
    /// Requested item name.
    pub item_name: String,
    /// Requested item description.
    pub item_description: String,
    /// Requested quantity.
    pub quantity: i32,
    /// Optional technical specifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,
    /// Workflow status literal.
    pub status: TicketStatus,
    /// Creator's user id.
    pub created_by: String,
    /// Whether the ticket was resubmitted after a revision request.
    pub is_revised: bool,
    /// Assigned reviewer ids.
    pub reviewers: Vec<String>,
    /// Sharee ids.
    pub shared_with: Vec<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last modification timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            name: ticket.name.to_string(),
            item_name: ticket.item.name,
            item_description: ticket.item.description,
            quantity: ticket.item.quantity,
            specifications: ticket.item.specifications,
            status: ticket.status,
            created_by: ticket.created_by.to_string(),
            is_revised: ticket.is_revised,
            reviewers: ticket.reviewers.iter().map(ToString::to_string).collect(),
            shared_with: ticket.shared_with.iter().map(ToString::to_string).collect(),
            created_at: ticket.created_at.to_rfc3339(),
            updated_at: ticket.updated_at.to_rfc3339(),
        }
    }
}

/// One page of tickets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketPageResponse {
    /// Tickets newest first.
    pub items: Vec<TicketResponse>,
    /// Continuation token, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Page<Ticket>> for TicketPageResponse {
    fn from(page: Page<Ticket>) -> Self {
        let page = page.map(TicketResponse::from);
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

/// Reviewer approval payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    /// Approval record id.
    pub id: String,
    /// Ticket id.
    pub ticket_id: String,
    /// Reviewer's user id.
    pub reviewer_id: String,
    /// Sign-off status literal.
    pub status: String,
    /// Review timestamp (RFC 3339), once decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
}

impl From<Approval> for ApprovalResponse {
    fn from(approval: Approval) -> Self {
        Self {
            id: approval.id.to_string(),
            ticket_id: approval.ticket_id.to_string(),
            reviewer_id: approval.reviewer_id.to_string(),
            status: approval.status.to_string(),
            review_date: approval.review_date.map(|at| at.to_rfc3339()),
        }
    }
}

/// Attachment payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    /// Attachment id.
    pub id: String,
    /// Attachment kind literal.
    pub kind: String,
    /// Original file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Blob size in bytes.
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 checksum.
    pub checksum: String,
}

impl From<CanvassAttachment> for AttachmentResponse {
    fn from(attachment: CanvassAttachment) -> Self {
        Self {
            id: attachment.id.to_string(),
            kind: attachment.kind.to_string(),
            file_name: attachment.file_name,
            content_type: attachment.content_type,
            size_bytes: attachment.size_bytes,
            checksum: attachment.checksum_hex,
        }
    }
}

/// Canvass form payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CanvassFormResponse {
    /// Form id.
    pub id: String,
    /// Ticket id.
    pub ticket_id: String,
    /// Submitter's user id.
    pub submitted_by: String,
    /// Winning supplier's name.
    pub supplier_name: String,
    /// Date the request for quotation was received (ISO 8601).
    pub rf_date_received: String,
    /// Quoted lead time in days.
    pub lead_time_days: i32,
    /// Quoted payment terms.
    pub payment_terms: String,
    /// Quoted total in minor currency units.
    pub total_amount_cents: i64,
    /// Submission timestamp (RFC 3339).
    pub created_at: String,
    /// Attachments: one sheet plus quotations.
    pub attachments: Vec<AttachmentResponse>,
}

impl From<CanvassForm> for CanvassFormResponse {
    fn from(form: CanvassForm) -> Self {
        Self {
            id: form.id.to_string(),
            ticket_id: form.ticket_id.to_string(),
            submitted_by: form.submitted_by.to_string(),
            supplier_name: form.supplier_name,
            rf_date_received: form.rf_date_received.to_string(),
            lead_time_days: form.lead_time_days,
            payment_terms: form.payment_terms,
            total_amount_cents: form.total_amount_cents,
            created_at: form.created_at.to_rfc3339(),
            attachments: form.attachments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ticket detail payload: ticket plus approvals and forms.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetailResponse {
    /// The ticket itself.
    pub ticket: TicketResponse,
    /// Reviewer sign-off records.
    pub approvals: Vec<ApprovalResponse>,
    /// Submitted canvass forms, newest first.
    pub forms: Vec<CanvassFormResponse>,
}

impl From<TicketDetail> for TicketDetailResponse {
    fn from(detail: TicketDetail) -> Self {
        Self {
            ticket: detail.ticket.into(),
            approvals: detail.approvals.into_iter().map(Into::into).collect(),
            forms: detail.forms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Status history entry payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    /// Entry id.
    pub id: String,
    /// Status the ticket moved into.
    pub status: TicketStatus,
    /// Actor's user id.
    pub changed_by: String,
    /// Optional note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Transition timestamp (RFC 3339).
    pub created_at: String,
}

impl From<StatusHistoryEntry> for HistoryEntryResponse {
    fn from(entry: StatusHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            status: entry.status,
            changed_by: entry.changed_by.to_string(),
            note: entry.note,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Draft payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    /// Ticket id.
    pub ticket_id: String,
    /// Opaque client form snapshot.
    pub form: serde_json::Value,
    /// Monotonic save counter.
    pub revision: i32,
    /// Referenced upload ids.
    pub upload_ids: Vec<String>,
    /// Last save timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<CanvassDraft> for DraftResponse {
    fn from(draft: CanvassDraft) -> Self {
        Self {
            ticket_id: draft.ticket_id.to_string(),
            form: draft.form,
            revision: draft.revision,
            upload_ids: draft.upload_ids.iter().map(ToString::to_string).collect(),
            updated_at: draft.updated_at.to_rfc3339(),
        }
    }
}

/// Comment payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    /// Comment id.
    pub id: String,
    /// Ticket id.
    pub ticket_id: String,
    /// Author's user id.
    pub author_id: String,
    /// Comment text.
    pub body: String,
    /// Parent comment id when this is a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Whether the author has edited the body.
    pub edited: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last edit timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.to_string(),
            ticket_id: comment.ticket_id.to_string(),
            author_id: comment.author_id.to_string(),
            body: comment.body,
            reply_to: comment.reply_to.map(|id| id.to_string()),
            edited: comment.edited,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

/// One page of comments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPageResponse {
    /// Comments oldest first.
    pub items: Vec<CommentResponse>,
    /// Continuation token, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Page<Comment>> for CommentPageResponse {
    fn from(page: Page<Comment>) -> Self {
        let page = page.map(CommentResponse::from);
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

/// Notification payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Notification id.
    pub id: String,
    /// Ticket id.
    pub ticket_id: String,
    /// Ticket display code.
    pub ticket_name: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the recipient has seen it.
    pub read: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            ticket_id: notification.ticket_id.to_string(),
            ticket_name: notification.ticket_name,
            message: notification.message,
            read: notification.read,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// One page of notifications plus the unread count.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeedResponse {
    /// Notifications newest first.
    pub items: Vec<NotificationResponse>,
    /// Continuation token, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Unread notifications across the whole feed.
    pub unread: i64,
}

/// Dashboard payload (already wire-shaped in the domain).
pub type DashboardResponse = DashboardSummary;
