//! Canvass draft autosave handlers.
//!
//! ```text
//! GET    /api/v1/tickets/{ticket_id}/draft
//! PUT    /api/v1/tickets/{ticket_id}/draft
//! DELETE /api/v1/tickets/{ticket_id}/draft
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;

use super::ApiResult;
use super::dto::DraftResponse;
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::parse_uuid;

#[derive(Debug, Deserialize)]
struct TicketPath {
    ticket_id: String,
}

/// Request payload for an autosave.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    /// Opaque client form snapshot.
    pub form: serde_json::Value,
    /// Upload ids referenced by the draft.
    #[serde(default)]
    pub upload_ids: Vec<String>,
    /// Revision observed by the client; omit on the first save.
    pub expected_revision: Option<i32>,
}

/// Fetch the caller's draft for a ticket.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{ticket_id}/draft",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Draft", body = DraftResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No draft", body = Error)
    ),
    tags = ["drafts"],
    operation_id = "getDraft"
)]
#[get("/tickets/{ticket_id}/draft")]
pub async fn get_draft(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
) -> ApiResult<web::Json<DraftResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let draft = state
        .drafts
        .get(&actor, ticket_id)
        .await?
        .ok_or_else(|| Error::not_found("no draft for this ticket"))?;
    Ok(web::Json(draft.into()))
}

/// Save the caller's draft under a revision check.
#[utoipa::path(
    put,
    path = "/api/v1/tickets/{ticket_id}/draft",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = SaveDraftRequest,
    responses(
        (status = 200, description = "Draft saved", body = DraftResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Stale revision", body = Error)
    ),
    tags = ["drafts"],
    operation_id = "saveDraft"
)]
#[put("/tickets/{ticket_id}/draft")]
pub async fn save_draft(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<SaveDraftRequest>,
) -> ApiResult<web::Json<DraftResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let payload = payload.into_inner();
    let upload_ids = payload
        .upload_ids
        .iter()
        .map(|id| parse_uuid(id, "uploadIds"))
        .collect::<Result<Vec<_>, _>>()?;

    let draft = state
        .drafts
        .save(
            &actor,
            ticket_id,
            payload.form,
            upload_ids,
            payload.expected_revision,
        )
        .await?;
    Ok(web::Json(draft.into()))
}

/// Discard the caller's draft.
#[utoipa::path(
    delete,
    path = "/api/v1/tickets/{ticket_id}/draft",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No draft", body = Error)
    ),
    tags = ["drafts"],
    operation_id = "discardDraft"
)]
#[delete("/tickets/{ticket_id}/draft")]
pub async fn discard_draft(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let existed = state.drafts.discard(&actor, ticket_id).await?;
    if existed {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(Error::not_found("no draft for this ticket"))
    }
}
