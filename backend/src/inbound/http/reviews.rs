//! Reviewer decision HTTP handlers.
//!
//! ```text
//! GET  /api/v1/tickets/{ticket_id}/approvals
//! POST /api/v1/tickets/{ticket_id}/review
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::approval::ReviewDecision;
use crate::domain::ticket::TicketStatus;

use super::ApiResult;
use super::dto::ApprovalResponse;
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::parse_uuid;

#[derive(Debug, Deserialize)]
struct TicketPath {
    ticket_id: String,
}

/// Request payload for a reviewer decision.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// The decision to record.
    pub decision: ReviewDecision,
    /// Optional note recorded in the status history.
    pub note: Option<String>,
}

/// Response payload for a recorded decision.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReceiptResponse {
    /// The reviewer's updated approval row.
    pub approval: ApprovalResponse,
    /// Ticket status after any triggered transition.
    pub ticket_status: TicketStatus,
}

/// List a ticket's approval records.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{ticket_id}/approvals",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Approvals", body = [ApprovalResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "listApprovals"
)]
#[get("/tickets/{ticket_id}/approvals")]
pub async fn list_approvals(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
) -> ApiResult<web::Json<Vec<ApprovalResponse>>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let approvals = state.reviews.list(&actor, ticket_id).await?;
    Ok(web::Json(approvals.into_iter().map(Into::into).collect()))
}

/// Record the caller's review decision on a ticket in review.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/review",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Decision recorded", body = ReviewReceiptResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not a reviewer", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already decided or not in review", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "recordReview"
)]
#[post("/tickets/{ticket_id}/review")]
pub async fn record_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<ReviewRequest>,
) -> ApiResult<web::Json<ReviewReceiptResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let payload = payload.into_inner();
    let receipt = state
        .reviews
        .decide(&actor, ticket_id, payload.decision, payload.note)
        .await?;
    Ok(web::Json(ReviewReceiptResponse {
        approval: receipt.approval.into(),
        ticket_status: receipt.ticket_status,
    }))
}
