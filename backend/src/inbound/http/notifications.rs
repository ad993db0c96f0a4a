//! Notification feed handlers.
//!
//! ```text
//! GET  /api/v1/notifications?cursor=&limit=
//! POST /api/v1/notifications/{notification_id}/read
//! POST /api/v1/notifications/read-all
//! ```

use actix_web::{HttpResponse, get, post, web};
use pagination::Limit;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Error;

use super::ApiResult;
use super::dto::{NotificationFeedResponse, NotificationResponse};
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::parse_uuid;

#[derive(Debug, Deserialize)]
struct NotificationPath {
    notification_id: String,
}

/// Query parameters accepted by the feed listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// Continuation token from a previous page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<u32>,
}

/// Response payload for the bulk mark-read operation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllResponse {
    /// Number of notifications marked read.
    pub marked: i64,
}

/// List the caller's notifications newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(
        ("cursor" = Option<String>, Query, description = "Continuation token"),
        ("limit" = Option<u32>, Query, description = "Page size (1-100, default 20)")
    ),
    responses(
        (status = 200, description = "Notification feed", body = NotificationFeedResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<FeedQuery>,
) -> ApiResult<web::Json<NotificationFeedResponse>> {
    let actor = session.require_user_id()?;
    let query = query.into_inner();
    let feed = state
        .notifications
        .list(&actor, query.cursor, Limit::from_query(query.limit))
        .await?;
    Ok(web::Json(NotificationFeedResponse {
        items: feed
            .page
            .items
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        next_cursor: feed.page.next_cursor,
        unread: feed.unread,
    }))
}

/// Mark one notification read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{notification_id}/read",
    params(("notification_id" = String, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{notification_id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<NotificationPath>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let notification_id = parse_uuid(&path.notification_id, "notificationId")?;
    state.notifications.mark_read(&actor, notification_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Mark the whole feed read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Feed marked read", body = ReadAllResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ReadAllResponse>> {
    let actor = session.require_user_id()?;
    let marked = state.notifications.mark_all_read(&actor).await?;
    Ok(web::Json(ReadAllResponse { marked }))
}
