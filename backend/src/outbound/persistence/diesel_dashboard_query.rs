//! PostgreSQL-backed `DashboardQuery` implementation using Diesel ORM.
//!
//! Each count family is one grouped query; the original system aggregated
//! the dashboard with a sequential read loop per reviewer.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::approval::ApprovalStatus;
use crate::domain::dashboard::{DashboardSummary, StatusCount};
use crate::domain::ports::{DashboardQuery, DashboardQueryError};
use crate::domain::ticket::TicketStatus;
use crate::domain::user::{Role, UserId};

use super::diesel_helpers::impl_error_mappers;
use super::pool::DbPool;
use super::schema::{approvals, notifications, ticket_shares, tickets};

impl_error_mappers!(DashboardQueryError);

/// Diesel-backed implementation of the `DashboardQuery` port.
#[derive(Clone)]
pub struct DieselDashboardQuery {
    pool: DbPool,
}

impl DieselDashboardQuery {
    /// Create a new query adapter with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardQuery for DieselDashboardQuery {
    async fn summary(
        &self,
        viewer: &UserId,
        role: Role,
    ) -> Result<DashboardSummary, DashboardQueryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uid = *viewer.as_uuid();

        let mut count_query = tickets::table
            .group_by(tickets::status)
            .select((tickets::status, count_star()))
            .into_boxed();
        if !matches!(role, Role::Admin | Role::Manager) {
            let shared = ticket_shares::table
                .filter(ticket_shares::user_id.eq(uid))
                .select(ticket_shares::ticket_id);
            let reviewing = approvals::table
                .filter(approvals::reviewer_id.eq(uid))
                .select(approvals::ticket_id);
            count_query = count_query.filter(
                tickets::created_by
                    .eq(uid)
                    .or(tickets::id.eq_any(shared))
                    .or(tickets::id.eq_any(reviewing)),
            );
        }
        let raw_counts: Vec<(String, i64)> = count_query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let status_counts = raw_counts
            .into_iter()
            .map(|(status, count)| {
                let status = TicketStatus::parse(&status).map_err(|err| {
                    DashboardQueryError::query(format!("corrupt ticket row: {err}"))
                })?;
                Ok(StatusCount { status, count })
            })
            .collect::<Result<Vec<_>, DashboardQueryError>>()?;

        let awaiting_my_action: i64 = match role {
            Role::Reviewer => approvals::table
                .filter(
                    approvals::reviewer_id
                        .eq(uid)
                        .and(approvals::status.eq(ApprovalStatus::AwaitingAction.as_str())),
                )
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
            Role::Manager | Role::Admin => tickets::table
                .filter(tickets::status.eq(TicketStatus::ForApproval.as_str()))
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
            Role::Purchaser => tickets::table
                .filter(
                    tickets::created_by.eq(uid).and(tickets::status.eq_any([
                        TicketStatus::ForCanvass.as_str(),
                        TicketStatus::ForRevision.as_str(),
                    ])),
                )
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
        };

        let unread_notifications: i64 = notifications::table
            .filter(
                notifications::user_id
                    .eq(uid)
                    .and(notifications::is_read.eq(false)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(DashboardSummary {
            status_counts,
            awaiting_my_action,
            unread_notifications,
        })
    }
}
