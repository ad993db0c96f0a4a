//! Canvass upload, submission, and attachment handlers.
//!
//! ```text
//! POST /api/v1/tickets/{ticket_id}/uploads?kind=&fileName=   (raw body)
//! POST /api/v1/tickets/{ticket_id}/canvass
//! GET  /api/v1/attachments/{attachment_id}
//! POST /api/v1/uploads/sweep
//! ```
//!
//! Uploads take the raw request body with metadata in query parameters so
//! the later submission step stays a single JSON transaction referencing
//! upload ids.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::canvass::{AttachmentKind, NewCanvassForm};
use crate::domain::ports::UploadRequest;

use super::ApiResult;
use super::dto::CanvassFormResponse;
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::parse_uuid;

#[derive(Debug, Deserialize)]
struct TicketPath {
    ticket_id: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentPath {
    attachment_id: String,
}

/// Query parameters accompanying a raw upload body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Attachment kind literal (`canvass_sheet` or `quotation`).
    pub kind: String,
    /// Original file name.
    pub file_name: String,
}

/// Response payload for a registered upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Upload id to reference at submission.
    pub upload_id: String,
    /// Attachment kind literal.
    pub kind: String,
    /// Original file name.
    pub file_name: String,
    /// Blob size in bytes.
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 checksum computed server-side.
    pub checksum: String,
}

/// Request payload for submitting a canvass form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCanvassRequest {
    /// Winning supplier's name.
    pub supplier_name: String,
    /// Date the request for quotation was received (ISO 8601).
    pub rf_date_received: NaiveDate,
    /// Quoted lead time in days.
    pub lead_time_days: i32,
    /// Quoted payment terms.
    pub payment_terms: String,
    /// Quoted total in minor currency units.
    pub total_amount_cents: i64,
    /// Previously uploaded attachment ids (one sheet, 1-5 quotations).
    pub upload_ids: Vec<String>,
}

/// Request payload for the orphan upload sweep.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepRequest {
    /// Reclaim uploads older than this many hours (default 24).
    pub older_than_hours: Option<i64>,
}

/// Response payload for the orphan upload sweep.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    /// Number of uploads reclaimed.
    pub reclaimed: u64,
}

/// Stage an attachment blob ahead of submission.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/uploads",
    params(
        ("ticket_id" = String, Path, description = "Ticket id"),
        ("kind" = String, Query, description = "canvass_sheet or quotation"),
        ("fileName" = String, Query, description = "Original file name")
    ),
    request_body(content = Vec<u8>, description = "Raw file content"),
    responses(
        (status = 201, description = "Upload staged", body = UploadResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Ticket not being canvassed", body = Error)
    ),
    tags = ["canvass"],
    operation_id = "stageUpload"
)]
#[post("/tickets/{ticket_id}/uploads")]
pub async fn stage_upload(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    query: web::Query<UploadQuery>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<(web::Json<UploadResponse>, actix_web::http::StatusCode)> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let kind = AttachmentKind::parse(&query.kind)
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_owned();

    let upload = state
        .canvass
        .register_upload(
            &actor,
            ticket_id,
            UploadRequest {
                kind,
                file_name: query.into_inner().file_name,
                content_type,
                bytes: body.to_vec(),
            },
        )
        .await?;

    Ok((
        web::Json(UploadResponse {
            upload_id: upload.id.to_string(),
            kind: upload.kind.to_string(),
            file_name: upload.file_name,
            size_bytes: upload.size_bytes,
            checksum: upload.checksum_hex,
        }),
        actix_web::http::StatusCode::CREATED,
    ))
}

/// Submit a canvass form referencing staged uploads.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/canvass",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = SubmitCanvassRequest,
    responses(
        (status = 201, description = "Form submitted", body = CanvassFormResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Ticket status changed", body = Error)
    ),
    tags = ["canvass"],
    operation_id = "submitCanvass"
)]
#[post("/tickets/{ticket_id}/canvass")]
pub async fn submit_canvass(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<SubmitCanvassRequest>,
) -> ApiResult<(web::Json<CanvassFormResponse>, actix_web::http::StatusCode)> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let payload = payload.into_inner();

    let form = NewCanvassForm::new(
        &payload.supplier_name,
        payload.rf_date_received,
        payload.lead_time_days,
        payload.payment_terms,
        payload.total_amount_cents,
    )
    .map_err(|err| Error::invalid_request(err.to_string()))?;
    let upload_ids = payload
        .upload_ids
        .iter()
        .map(|id| parse_uuid(id, "uploadIds"))
        .collect::<Result<Vec<_>, _>>()?;

    let stored = state
        .canvass
        .submit(&actor, ticket_id, form, upload_ids)
        .await?;
    Ok((
        web::Json(stored.into()),
        actix_web::http::StatusCode::CREATED,
    ))
}

/// Download one attachment.
#[utoipa::path(
    get,
    path = "/api/v1/attachments/{attachment_id}",
    params(("attachment_id" = String, Path, description = "Attachment id")),
    responses(
        (status = 200, description = "Attachment content"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["canvass"],
    operation_id = "downloadAttachment"
)]
#[get("/attachments/{attachment_id}")]
pub async fn download_attachment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<AttachmentPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let attachment_id = parse_uuid(&path.attachment_id, "attachmentId")?;
    let download = state.canvass.open_attachment(&actor, attachment_id).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, download.attachment.content_type))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                download.attachment.file_name.replace('"', "")
            ),
        ))
        .body(download.bytes))
}

/// Reclaim pending uploads that were never attached (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/uploads/sweep",
    request_body = SweepRequest,
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["canvass"],
    operation_id = "sweepUploads"
)]
#[post("/uploads/sweep")]
pub async fn sweep_uploads(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SweepRequest>,
) -> ApiResult<web::Json<SweepResponse>> {
    let actor = session.require_user_id()?;
    let hours = payload.older_than_hours.unwrap_or(24).max(1);
    let cutoff = Utc::now() - Duration::hours(hours);
    let reclaimed = state.canvass.sweep_orphan_uploads(&actor, cutoff).await?;
    Ok(web::Json(SweepResponse { reclaimed }))
}
