//! PostgreSQL-backed `ApprovalRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::approval::{Approval, ApprovalStatus};
use crate::domain::ports::{ApprovalRepository, ApprovalRepositoryError};
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::ApprovalRow;
use super::pool::DbPool;
use super::schema::approvals;

impl_error_mappers!(ApprovalRepositoryError);

/// Diesel-backed implementation of the `ApprovalRepository` port.
#[derive(Clone)]
pub struct DieselApprovalRepository {
    pool: DbPool,
}

impl DieselApprovalRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain approval.
fn row_to_approval(row: ApprovalRow) -> Result<Approval, ApprovalRepositoryError> {
    let status = ApprovalStatus::parse(&row.status).ok_or_else(|| {
        ApprovalRepositoryError::query(format!("corrupt approval row: {}", row.status))
    })?;
    Ok(Approval {
        id: row.id,
        ticket_id: row.ticket_id,
        reviewer_id: UserId::from_uuid(row.reviewer_id),
        status,
        review_date: row.review_date,
    })
}

/// Transaction-internal failures that need to survive the rollback.
enum TxError {
    Db(diesel::result::Error),
    NotAssigned,
    AlreadyDecided { status: String },
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

#[async_trait]
impl ApprovalRepository for DieselApprovalRepository {
    async fn list_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<Approval>, ApprovalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ApprovalRow> = approvals::table
            .filter(approvals::ticket_id.eq(ticket_id))
            .order(approvals::created_at.asc())
            .select(ApprovalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_approval).collect()
    }

    async fn find(
        &self,
        ticket_id: Uuid,
        reviewer_id: &UserId,
    ) -> Result<Option<Approval>, ApprovalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ApprovalRow> = approvals::table
            .filter(
                approvals::ticket_id
                    .eq(ticket_id)
                    .and(approvals::reviewer_id.eq(reviewer_id.as_uuid())),
            )
            .select(ApprovalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_approval).transpose()
    }

    async fn record_decision(
        &self,
        ticket_id: Uuid,
        reviewer_id: &UserId,
        status: ApprovalStatus,
        review_date: DateTime<Utc>,
    ) -> Result<Vec<Approval>, ApprovalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reviewer_uuid = *reviewer_id.as_uuid();

        let rows = conn
            .transaction::<Vec<ApprovalRow>, TxError, _>(|conn| {
                async move {
                    let undecided = [
                        ApprovalStatus::Pending.as_str(),
                        ApprovalStatus::AwaitingAction.as_str(),
                    ];
                    let updated = diesel::update(
                        approvals::table.filter(
                            approvals::ticket_id
                                .eq(ticket_id)
                                .and(approvals::reviewer_id.eq(reviewer_uuid))
                                .and(approvals::status.eq_any(undecided)),
                        ),
                    )
                    .set((
                        approvals::status.eq(status.as_str()),
                        approvals::review_date.eq(Some(review_date)),
                        approvals::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;

                    if updated == 0 {
                        let existing: Option<String> = approvals::table
                            .filter(
                                approvals::ticket_id
                                    .eq(ticket_id)
                                    .and(approvals::reviewer_id.eq(reviewer_uuid)),
                            )
                            .select(approvals::status)
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(match existing {
                            None => TxError::NotAssigned,
                            Some(status) => TxError::AlreadyDecided { status },
                        });
                    }

                    let rows: Vec<ApprovalRow> = approvals::table
                        .filter(approvals::ticket_id.eq(ticket_id))
                        .order(approvals::created_at.asc())
                        .select(ApprovalRow::as_select())
                        .load(conn)
                        .await?;
                    Ok(rows)
                }
                .scope_boxed()
            })
            .await;

        match rows {
            Ok(rows) => rows.into_iter().map(row_to_approval).collect(),
            Err(TxError::NotAssigned) => Err(ApprovalRepositoryError::not_assigned(
                ticket_id.to_string(),
                reviewer_id.to_string(),
            )),
            Err(TxError::AlreadyDecided { status }) => {
                Err(ApprovalRepositoryError::already_decided(status))
            }
            Err(TxError::Db(error)) => Err(map_diesel_error(error)),
        }
    }
}
