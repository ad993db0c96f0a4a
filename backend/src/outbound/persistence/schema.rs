//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; regenerate with
//! `diesel print-schema` after schema changes.

diesel::table! {
    /// Registered users with roles and credential digests.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name shown in listings and notifications.
        display_name -> Varchar,
        /// Unique normalised login address.
        email -> Varchar,
        /// Workflow role literal (`ADMIN`, `MANAGER`, `REVIEWER`, `PURCHASER`).
        role -> Varchar,
        /// Optional avatar image URL.
        avatar_url -> Nullable<Varchar>,
        /// Hex-encoded credential salt.
        password_salt -> Varchar,
        /// Hex-encoded salted credential digest.
        password_digest -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-day ticket name sequence counters.
    ticket_sequences (sequence_date) {
        /// Calendar date the counter covers.
        sequence_date -> Date,
        /// Last allocated sequence number for that date.
        next_value -> Int4,
    }
}

diesel::table! {
    /// Procurement tickets.
    tickets (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Sequence-and-date code, unique (`PT-0042-080626`).
        name -> Varchar,
        /// Requested item name.
        item_name -> Varchar,
        /// Requested item description.
        item_description -> Text,
        /// Requested quantity.
        quantity -> Int4,
        /// Optional technical specifications.
        specifications -> Nullable<Text>,
        /// Workflow status literal (`FOR CANVASS`, ...).
        status -> Varchar,
        /// Creating user.
        created_by -> Uuid,
        /// Whether the ticket was resubmitted after a revision request.
        is_revised -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Users a ticket has been shared with.
    ticket_shares (ticket_id, user_id) {
        /// Shared ticket.
        ticket_id -> Uuid,
        /// Sharee.
        user_id -> Uuid,
        /// Share timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ticket status audit trail.
    ticket_status_history (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ticket the entry belongs to.
        ticket_id -> Uuid,
        /// Status the ticket moved into.
        status -> Varchar,
        /// Actor who caused the transition.
        changed_by -> Uuid,
        /// Optional note (decline reason etc.).
        note -> Nullable<Text>,
        /// Transition timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reviewer sign-off records, one per (ticket, reviewer).
    approvals (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ticket under review.
        ticket_id -> Uuid,
        /// Assigned reviewer.
        reviewer_id -> Uuid,
        /// Sign-off status literal (`PENDING`, `AWAITING ACTION`, ...).
        status -> Varchar,
        /// When the reviewer decided, if they have.
        review_date -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Submitted supplier price comparisons.
    canvass_forms (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ticket the form belongs to.
        ticket_id -> Uuid,
        /// Submitting purchaser.
        submitted_by -> Uuid,
        /// Winning supplier's name.
        supplier_name -> Varchar,
        /// Date the request for quotation was received.
        rf_date_received -> Date,
        /// Quoted lead time in days.
        lead_time_days -> Int4,
        /// Quoted payment terms.
        payment_terms -> Varchar,
        /// Quoted total in minor currency units.
        total_amount_cents -> Int8,
        /// Submission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Files attached to submitted canvass forms.
    canvass_attachments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Form the attachment belongs to.
        form_id -> Uuid,
        /// Attachment kind literal (`canvass_sheet`, `quotation`).
        kind -> Varchar,
        /// Original file name.
        file_name -> Varchar,
        /// Declared content type.
        content_type -> Varchar,
        /// Blob size in bytes.
        size_bytes -> Int8,
        /// Hex-encoded SHA-256 of the blob.
        checksum_hex -> Varchar,
        /// Object-store key holding the blob.
        storage_key -> Varchar,
        /// Attachment timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Uploaded blobs awaiting submission.
    pending_uploads (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ticket the upload is scoped to.
        ticket_id -> Uuid,
        /// Uploading user.
        uploaded_by -> Uuid,
        /// Attachment kind literal.
        kind -> Varchar,
        /// Original file name.
        file_name -> Varchar,
        /// Declared content type.
        content_type -> Varchar,
        /// Blob size in bytes.
        size_bytes -> Int8,
        /// Hex-encoded SHA-256 of the blob.
        checksum_hex -> Varchar,
        /// Object-store key holding the blob.
        storage_key -> Varchar,
        /// Upload timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Autosaved canvass drafts, one per (ticket, user).
    canvass_drafts (ticket_id, user_id) {
        /// Ticket the draft belongs to.
        ticket_id -> Uuid,
        /// Draft owner.
        user_id -> Uuid,
        /// Opaque client form snapshot.
        form -> Jsonb,
        /// Upload ids referenced by the draft.
        upload_ids -> Array<Uuid>,
        /// Monotonic save counter.
        revision -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last save timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ticket-scoped comments, optionally threaded.
    comments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ticket the comment belongs to.
        ticket_id -> Uuid,
        /// Comment author.
        author_id -> Uuid,
        /// Comment text.
        body -> Text,
        /// Parent comment when this is a reply.
        reply_to -> Nullable<Uuid>,
        /// Set once the author has edited the body.
        edited -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last edit timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user notifications tied to tickets.
    notifications (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Recipient.
        user_id -> Uuid,
        /// Ticket the message concerns.
        ticket_id -> Uuid,
        /// Human-readable message.
        message -> Text,
        /// Whether the recipient has seen it.
        is_read -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_shares -> tickets (ticket_id));
diesel::joinable!(ticket_status_history -> tickets (ticket_id));
diesel::joinable!(approvals -> tickets (ticket_id));
diesel::joinable!(canvass_forms -> tickets (ticket_id));
diesel::joinable!(canvass_attachments -> canvass_forms (form_id));
diesel::joinable!(pending_uploads -> tickets (ticket_id));
diesel::joinable!(comments -> tickets (ticket_id));
diesel::joinable!(notifications -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    ticket_sequences,
    tickets,
    ticket_shares,
    ticket_status_history,
    approvals,
    canvass_forms,
    canvass_attachments,
    pending_uploads,
    canvass_drafts,
    comments,
    notifications,
);
