//! Ticket HTTP handlers.
//!
//! ```text
//! POST /api/v1/tickets
//! GET  /api/v1/tickets?status=&createdOnly=&cursor=&limit=
//! GET  /api/v1/tickets/{ticket_id}
//! POST /api/v1/tickets/{ticket_id}/actions
//! POST /api/v1/tickets/{ticket_id}/shares
//! GET  /api/v1/tickets/{ticket_id}/history
//! ```

use actix_web::{get, post, web};
use pagination::Limit;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::TicketListRequest;
use crate::domain::ticket::{
    ItemDetails, NewTicket, TicketAction, TicketStatus,
};

use super::ApiResult;
use super::dto::{
    HistoryEntryResponse, TicketDetailResponse, TicketPageResponse, TicketResponse,
};
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::{parse_uuid, parse_user_ids};

#[derive(Debug, Deserialize)]
struct TicketPath {
    ticket_id: String,
}

/// Request payload for creating a ticket.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// Requested item name.
    pub item_name: String,
    /// Requested item description.
    #[serde(default)]
    pub item_description: String,
    /// Requested quantity.
    pub quantity: i32,
    /// Optional technical specifications.
    pub specifications: Option<String>,
    /// Reviewer user ids (must hold the reviewer role).
    pub reviewers: Vec<String>,
    /// Users to share the ticket with at creation.
    #[serde(default)]
    pub shared_with: Vec<String>,
}

/// Request payload for a direct workflow action.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketActionRequest {
    /// The action to apply.
    pub action: TicketAction,
    /// Optional note recorded in the status history.
    pub note: Option<String>,
}

/// Request payload for sharing a ticket.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// User ids to share with.
    pub user_ids: Vec<String>,
}

/// Query parameters accepted by the ticket listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListQuery {
    /// Restrict to one status literal.
    pub status: Option<String>,
    /// Restrict to tickets the caller created.
    #[serde(default)]
    pub created_only: bool,
    /// Continuation token from a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<u32>,
}

/// Create a ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateTicketRequest>,
) -> ApiResult<(web::Json<TicketResponse>, actix_web::http::StatusCode)> {
    let actor = session.require_user_id()?;
    let payload = payload.into_inner();

    let item = ItemDetails::new(
        &payload.item_name,
        &payload.item_description,
        payload.quantity,
        payload.specifications,
    )
    .map_err(|err| Error::invalid_request(err.to_string()))?;
    let reviewers = parse_user_ids(&payload.reviewers, "reviewers")?;
    let shared_with = parse_user_ids(&payload.shared_with, "sharedWith")?;
    let new = NewTicket::new(item, reviewers, shared_with)
        .map_err(|err| Error::invalid_request(err.to_string()))?;

    let ticket = state.tickets.create(&actor, new).await?;
    Ok((
        web::Json(ticket.into()),
        actix_web::http::StatusCode::CREATED,
    ))
}

/// List tickets visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets",
    params(
        ("status" = Option<String>, Query, description = "Status literal filter"),
        ("createdOnly" = Option<bool>, Query, description = "Only tickets the caller created"),
        ("cursor" = Option<String>, Query, description = "Continuation token"),
        ("limit" = Option<u32>, Query, description = "Page size (1-100, default 20)")
    ),
    responses(
        (status = 200, description = "Ticket page", body = TicketPageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<TicketListQuery>,
) -> ApiResult<web::Json<TicketPageResponse>> {
    let actor = session.require_user_id()?;
    let query = query.into_inner();

    let status = query
        .status
        .as_deref()
        .map(TicketStatus::parse)
        .transpose()
        .map_err(|err| Error::invalid_request(err.to_string()))?;

    let page = state
        .tickets
        .list(
            &actor,
            TicketListRequest {
                status,
                created_only: query.created_only,
                cursor: query.cursor,
                limit: Limit::from_query(query.limit),
            },
        )
        .await?;
    Ok(web::Json(page.into()))
}

/// Fetch one ticket with its approvals and submitted forms.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{ticket_id}",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket detail", body = TicketDetailResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{ticket_id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
) -> ApiResult<web::Json<TicketDetailResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let detail = state.tickets.get(&actor, ticket_id).await?;
    Ok(web::Json(detail.into()))
}

/// Apply a direct workflow action to a ticket.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/actions",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = TicketActionRequest,
    responses(
        (status = 200, description = "Action applied", body = TicketResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Illegal transition or lost race", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "applyTicketAction"
)]
#[post("/tickets/{ticket_id}/actions")]
pub async fn apply_ticket_action(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<TicketActionRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let payload = payload.into_inner();
    let ticket = state
        .tickets
        .apply_action(&actor, ticket_id, payload.action, payload.note)
        .await?;
    Ok(web::Json(ticket.into()))
}

/// Share a ticket with more users.
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/shares",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Newly added user ids", body = [String]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "shareTicket"
)]
#[post("/tickets/{ticket_id}/shares")]
pub async fn share_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<ShareRequest>,
) -> ApiResult<web::Json<Vec<String>>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let users = parse_user_ids(&payload.user_ids, "userIds")?;
    let added = state.tickets.share(&actor, ticket_id, users).await?;
    Ok(web::Json(added.iter().map(ToString::to_string).collect()))
}

/// Status audit trail, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{ticket_id}/history",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "History entries", body = [HistoryEntryResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "ticketHistory"
)]
#[get("/tickets/{ticket_id}/history")]
pub async fn ticket_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
) -> ApiResult<web::Json<Vec<HistoryEntryResponse>>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let entries = state.tickets.history(&actor, ticket_id).await?;
    Ok(web::Json(entries.into_iter().map(Into::into).collect()))
}
