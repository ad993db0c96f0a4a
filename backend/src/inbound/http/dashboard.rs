//! Dashboard handler.
//!
//! ```text
//! GET /api/v1/dashboard
//! ```

use actix_web::{get, web};

use crate::domain::Error;
use crate::domain::dashboard::DashboardSummary;
use crate::domain::ports::DashboardQueryError;

use super::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;

fn map_dashboard_error(error: DashboardQueryError) -> Error {
    match error {
        DashboardQueryError::Connection { message } => {
            Error::service_unavailable(format!("dashboard store unavailable: {message}"))
        }
        DashboardQueryError::Query { message } => {
            Error::internal(format!("dashboard query error: {message}"))
        }
    }
}

/// Per-actor dashboard aggregation.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DashboardSummary>> {
    let actor = session.require_user_id()?;
    let user = state
        .users
        .find_by_id(&actor)
        .await
        .map_err(|err| Error::internal(format!("user lookup failed: {err}")))?
        .ok_or_else(|| Error::unauthorized("unknown user"))?;

    let summary = state
        .dashboard
        .summary(&actor, user.role)
        .await
        .map_err(map_dashboard_error)?;
    Ok(web::Json(summary))
}
