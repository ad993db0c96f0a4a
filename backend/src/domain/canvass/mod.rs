//! Canvass forms: supplier price-comparison submissions and their file
//! attachments.

mod service;
#[cfg(test)]
mod service_tests;

pub use service::CanvassService;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Most quotation attachments accepted on a single submission.
pub const MAX_QUOTATIONS: usize = 5;

/// Largest accepted upload in bytes (20 MiB).
pub const MAX_UPLOAD_BYTES: i64 = 20 * 1024 * 1024;

/// Validation errors raised by canvass value objects and submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvassValidationError {
    /// Supplier name was empty after trimming.
    EmptySupplierName,
    /// Submission carried no canvass sheet.
    MissingSheet,
    /// Submission carried more than one canvass sheet.
    MultipleSheets,
    /// Submission carried no quotations.
    NoQuotations,
    /// Submission carried more than [`MAX_QUOTATIONS`] quotations.
    TooManyQuotations {
        /// Maximum accepted count.
        max: usize,
    },
    /// Total amount was negative.
    NegativeAmount,
    /// Lead time was negative.
    NegativeLeadTime,
    /// File name was empty or contained path separators.
    InvalidFileName,
    /// Upload exceeded [`MAX_UPLOAD_BYTES`].
    UploadTooLarge {
        /// Maximum accepted size in bytes.
        max: i64,
    },
    /// Attachment kind string did not name a known kind.
    UnknownKind {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for CanvassValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySupplierName => write!(f, "supplier name must not be empty"),
            Self::MissingSheet => write!(f, "a canvass sheet attachment is required"),
            Self::MultipleSheets => write!(f, "only one canvass sheet is accepted"),
            Self::NoQuotations => write!(f, "at least one quotation attachment is required"),
            Self::TooManyQuotations { max } => {
                write!(f, "at most {max} quotation attachments are accepted")
            }
            Self::NegativeAmount => write!(f, "total amount must not be negative"),
            Self::NegativeLeadTime => write!(f, "lead time must not be negative"),
            Self::InvalidFileName => write!(f, "file name must be non-empty and path-free"),
            Self::UploadTooLarge { max } => {
                write!(f, "upload exceeds the {max} byte limit")
            }
            Self::UnknownKind { value } => write!(f, "unknown attachment kind: {value}"),
        }
    }
}

impl std::error::Error for CanvassValidationError {}

/// Attachment classification on a canvass submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// The comparison sheet summarising all collected quotes.
    CanvassSheet,
    /// One supplier's quotation document.
    Quotation,
}

impl AttachmentKind {
    /// Stable database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CanvassSheet => "canvass_sheet",
            Self::Quotation => "quotation",
        }
    }

    /// Parse the stable representation produced by
    /// [`AttachmentKind::as_str`].
    pub fn parse(value: &str) -> Result<Self, CanvassValidationError> {
        match value {
            "canvass_sheet" => Ok(Self::CanvassSheet),
            "quotation" => Ok(Self::Quotation),
            other => Err(CanvassValidationError::UnknownKind {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated attachment file name (no path separators, non-empty).
pub fn validate_file_name(name: &str) -> Result<&str, CanvassValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed == "."
        || trimmed == ".."
    {
        return Err(CanvassValidationError::InvalidFileName);
    }
    Ok(trimmed)
}

/// A blob uploaded ahead of submission, not yet attached to a form.
///
/// Uploads that are never attached are reclaimed by the orphan sweep; the
/// durable form/attachment rows are only written by the atomic submission
/// transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpload {
    /// Upload identifier returned to the client.
    pub id: Uuid,
    /// Ticket the upload is scoped to.
    pub ticket_id: Uuid,
    /// User who uploaded the blob.
    pub uploaded_by: UserId,
    /// Declared attachment kind.
    pub kind: AttachmentKind,
    /// Original file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Blob size in bytes.
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 of the blob, computed server-side.
    pub checksum_hex: String,
    /// Object-store key holding the blob.
    pub storage_key: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// A file attached to a submitted canvass form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvassAttachment {
    /// Attachment identifier.
    pub id: Uuid,
    /// Form the attachment belongs to.
    pub form_id: Uuid,
    /// Attachment classification.
    pub kind: AttachmentKind,
    /// Original file name.
    pub file_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Blob size in bytes.
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 of the blob.
    pub checksum_hex: String,
    /// Object-store key holding the blob.
    pub storage_key: String,
    /// Attachment timestamp.
    pub created_at: DateTime<Utc>,
}

/// A submitted supplier price comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvassForm {
    /// Form identifier.
    pub id: Uuid,
    /// Ticket the form belongs to.
    pub ticket_id: Uuid,
    /// Purchaser who submitted the form.
    pub submitted_by: UserId,
    /// Winning supplier's name.
    pub supplier_name: String,
    /// Date the request for quotation was received.
    pub rf_date_received: NaiveDate,
    /// Quoted lead time in days.
    pub lead_time_days: i32,
    /// Quoted payment terms.
    pub payment_terms: String,
    /// Quoted total in minor currency units.
    pub total_amount_cents: i64,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Attachments: one sheet plus quotations.
    pub attachments: Vec<CanvassAttachment>,
}

/// Validated canvass submission fields (attachment ids resolved separately).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCanvassForm {
    /// Winning supplier's name.
    pub supplier_name: String,
    /// Date the request for quotation was received.
    pub rf_date_received: NaiveDate,
    /// Quoted lead time in days.
    pub lead_time_days: i32,
    /// Quoted payment terms.
    pub payment_terms: String,
    /// Quoted total in minor currency units.
    pub total_amount_cents: i64,
}

impl NewCanvassForm {
    /// Validate and construct submission fields.
    pub fn new(
        supplier_name: impl AsRef<str>,
        rf_date_received: NaiveDate,
        lead_time_days: i32,
        payment_terms: impl Into<String>,
        total_amount_cents: i64,
    ) -> Result<Self, CanvassValidationError> {
        let supplier_name = supplier_name.as_ref().trim();
        if supplier_name.is_empty() {
            return Err(CanvassValidationError::EmptySupplierName);
        }
        if lead_time_days < 0 {
            return Err(CanvassValidationError::NegativeLeadTime);
        }
        if total_amount_cents < 0 {
            return Err(CanvassValidationError::NegativeAmount);
        }
        Ok(Self {
            supplier_name: supplier_name.to_owned(),
            rf_date_received,
            lead_time_days,
            payment_terms: payment_terms.into(),
            total_amount_cents,
        })
    }
}

/// Enforce the sheet/quotation cardinality rule over resolved uploads.
pub fn validate_attachment_set(
    uploads: &[PendingUpload],
) -> Result<(), CanvassValidationError> {
    let sheets = uploads
        .iter()
        .filter(|u| u.kind == AttachmentKind::CanvassSheet)
        .count();
    let quotations = uploads
        .iter()
        .filter(|u| u.kind == AttachmentKind::Quotation)
        .count();
    match sheets {
        0 => return Err(CanvassValidationError::MissingSheet),
        1 => {}
        _ => return Err(CanvassValidationError::MultipleSheets),
    }
    if quotations == 0 {
        return Err(CanvassValidationError::NoQuotations);
    }
    if quotations > MAX_QUOTATIONS {
        return Err(CanvassValidationError::TooManyQuotations {
            max: MAX_QUOTATIONS,
        });
    }
    Ok(())
}
