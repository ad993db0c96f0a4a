//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    approvals, canvass_attachments, canvass_drafts, canvass_forms, comments, notifications,
    pending_uploads, ticket_shares, ticket_status_history, tickets, users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub password_salt: String,
    pub password_digest: String,
}

// ---------------------------------------------------------------------------
// Ticket models
// ---------------------------------------------------------------------------

/// Row struct for reading from the tickets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: Uuid,
    pub name: String,
    pub item_name: String,
    pub item_description: String,
    pub quantity: i32,
    pub specifications: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub is_revised: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new ticket records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub(crate) struct NewTicketRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub item_name: &'a str,
    pub item_description: &'a str,
    pub quantity: i32,
    pub specifications: Option<&'a str>,
    pub status: &'a str,
    pub created_by: Uuid,
}

/// Insertable struct for share rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_shares)]
pub(crate) struct NewTicketShareRow {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
}

/// Row struct for reading from the status history table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ticket_status_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StatusHistoryRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub status: String,
    pub changed_by: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for history entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_status_history)]
pub(crate) struct NewStatusHistoryRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub status: &'a str,
    pub changed_by: Uuid,
    pub note: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Approval models
// ---------------------------------------------------------------------------

/// Row struct for reading from the approvals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = approvals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ApprovalRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: String,
    pub review_date: Option<DateTime<Utc>>,
}

/// Insertable struct for reviewer assignment rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = approvals)]
pub(crate) struct NewApprovalRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub reviewer_id: Uuid,
    pub status: &'a str,
}

// ---------------------------------------------------------------------------
// Canvass models
// ---------------------------------------------------------------------------

/// Row struct for reading from the canvass forms table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = canvass_forms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CanvassFormRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub submitted_by: Uuid,
    pub supplier_name: String,
    pub rf_date_received: NaiveDate,
    pub lead_time_days: i32,
    pub payment_terms: String,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for canvass form records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = canvass_forms)]
pub(crate) struct NewCanvassFormRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub submitted_by: Uuid,
    pub supplier_name: &'a str,
    pub rf_date_received: NaiveDate,
    pub lead_time_days: i32,
    pub payment_terms: &'a str,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the attachments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = canvass_attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CanvassAttachmentRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub kind: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub checksum_hex: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for attachment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = canvass_attachments)]
pub(crate) struct NewCanvassAttachmentRow<'a> {
    pub id: Uuid,
    pub form_id: Uuid,
    pub kind: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub checksum_hex: &'a str,
    pub storage_key: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the pending uploads table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pending_uploads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PendingUploadRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub uploaded_by: Uuid,
    pub kind: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub checksum_hex: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for pending upload records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pending_uploads)]
pub(crate) struct NewPendingUploadRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub uploaded_by: Uuid,
    pub kind: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
    pub checksum_hex: &'a str,
    pub storage_key: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Draft models
// ---------------------------------------------------------------------------

/// Row struct for reading from the drafts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = canvass_drafts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DraftRow {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub form: serde_json::Value,
    pub upload_ids: Vec<Uuid>,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for first draft saves.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = canvass_drafts)]
pub(crate) struct NewDraftRow<'a> {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub form: &'a serde_json::Value,
    pub upload_ids: &'a [Uuid],
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment models
// ---------------------------------------------------------------------------

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub reply_to: Option<Uuid>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for comment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub body: &'a str,
    pub reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notification models
// ---------------------------------------------------------------------------

/// Row struct for reading from the notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for notification records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ticket_id: Uuid,
    pub message: &'a str,
    pub created_at: DateTime<Utc>,
}
