//! Ticket comment handlers.
//!
//! ```text
//! GET    /api/v1/tickets/{ticket_id}/comments?cursor=&limit=
//! POST   /api/v1/tickets/{ticket_id}/comments
//! PUT    /api/v1/comments/{comment_id}
//! DELETE /api/v1/comments/{comment_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use pagination::Limit;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;

use super::ApiResult;
use super::dto::{CommentPageResponse, CommentResponse};
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::parse_uuid;

#[derive(Debug, Deserialize)]
struct TicketPath {
    ticket_id: String,
}

#[derive(Debug, Deserialize)]
struct CommentPath {
    comment_id: String,
}

/// Query parameters accepted by the comment listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    /// Continuation token from a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<u32>,
}

/// Request payload for posting a comment.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentRequest {
    /// Comment text.
    pub body: String,
    /// Parent comment id when replying.
    pub reply_to: Option<String>,
}

/// Request payload for editing a comment.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditCommentRequest {
    /// Replacement text.
    pub body: String,
}

/// List a ticket's comments oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/tickets/{ticket_id}/comments",
    params(
        ("ticket_id" = String, Path, description = "Ticket id"),
        ("cursor" = Option<String>, Query, description = "Continuation token"),
        ("limit" = Option<u32>, Query, description = "Page size (1-100, default 20)")
    ),
    responses(
        (status = 200, description = "Comment page", body = CommentPageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "listComments"
)]
#[get("/tickets/{ticket_id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    query: web::Query<CommentListQuery>,
) -> ApiResult<web::Json<CommentPageResponse>> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let query = query.into_inner();
    let page = state
        .comments
        .list(&actor, ticket_id, query.cursor, Limit::from_query(query.limit))
        .await?;
    Ok(web::Json(page.into()))
}

/// Post a comment (optionally a reply).
#[utoipa::path(
    post,
    path = "/api/v1/tickets/{ticket_id}/comments",
    params(("ticket_id" = String, Path, description = "Ticket id")),
    request_body = PostCommentRequest,
    responses(
        (status = 201, description = "Comment posted", body = CommentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "postComment"
)]
#[post("/tickets/{ticket_id}/comments")]
pub async fn post_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<TicketPath>,
    payload: web::Json<PostCommentRequest>,
) -> ApiResult<(web::Json<CommentResponse>, actix_web::http::StatusCode)> {
    let actor = session.require_user_id()?;
    let ticket_id = parse_uuid(&path.ticket_id, "ticketId")?;
    let payload = payload.into_inner();
    let reply_to = payload
        .reply_to
        .as_deref()
        .map(|id| parse_uuid(id, "replyTo"))
        .transpose()?;

    let comment = state
        .comments
        .post(&actor, ticket_id, payload.body, reply_to)
        .await?;
    Ok((
        web::Json(comment.into()),
        actix_web::http::StatusCode::CREATED,
    ))
}

/// Edit the caller's own comment.
#[utoipa::path(
    put,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    request_body = EditCommentRequest,
    responses(
        (status = 200, description = "Comment edited", body = CommentResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "editComment"
)]
#[put("/comments/{comment_id}")]
pub async fn edit_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<CommentPath>,
    payload: web::Json<EditCommentRequest>,
) -> ApiResult<web::Json<CommentResponse>> {
    let actor = session.require_user_id()?;
    let comment_id = parse_uuid(&path.comment_id, "commentId")?;
    let comment = state
        .comments
        .edit(&actor, comment_id, payload.into_inner().body)
        .await?;
    Ok(web::Json(comment.into()))
}

/// Delete a comment (author or admin).
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "deleteComment"
)]
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<CommentPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let comment_id = parse_uuid(&path.comment_id, "commentId")?;
    state.comments.remove(&actor, comment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
