//! PostgreSQL-backed `DraftRepository` implementation using Diesel ORM.
//!
//! Saves are revision-checked updates: `UPDATE ... WHERE revision =
//! expected` so a stale autosave loses instead of clobbering newer state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::draft::CanvassDraft;
use crate::domain::ports::{DraftRepository, DraftRepositoryError};
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::{DraftRow, NewDraftRow};
use super::pool::DbPool;
use super::schema::canvass_drafts;

impl_error_mappers!(DraftRepositoryError);

/// Diesel-backed implementation of the `DraftRepository` port.
#[derive(Clone)]
pub struct DieselDraftRepository {
    pool: DbPool,
}

impl DieselDraftRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn current_revision(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
    ) -> Result<Option<i32>, DraftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        canvass_drafts::table
            .filter(
                canvass_drafts::ticket_id
                    .eq(ticket_id)
                    .and(canvass_drafts::user_id.eq(user_id.as_uuid())),
            )
            .select(canvass_drafts::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }
}

/// Convert a database row to a domain draft.
fn row_to_draft(row: DraftRow) -> CanvassDraft {
    CanvassDraft {
        ticket_id: row.ticket_id,
        user_id: UserId::from_uuid(row.user_id),
        form: row.form,
        revision: row.revision,
        updated_at: row.updated_at,
        upload_ids: row.upload_ids,
    }
}

fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

#[async_trait]
impl DraftRepository for DieselDraftRepository {
    async fn find(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
    ) -> Result<Option<CanvassDraft>, DraftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DraftRow> = canvass_drafts::table
            .filter(
                canvass_drafts::ticket_id
                    .eq(ticket_id)
                    .and(canvass_drafts::user_id.eq(user_id.as_uuid())),
            )
            .select(DraftRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_draft))
    }

    async fn upsert(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
        form: &Value,
        upload_ids: &[Uuid],
        expected_revision: Option<i32>,
        saved_at: DateTime<Utc>,
    ) -> Result<CanvassDraft, DraftRepositoryError> {
        match expected_revision {
            None => {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let inserted: Result<DraftRow, _> =
                    diesel::insert_into(canvass_drafts::table)
                        .values(NewDraftRow {
                            ticket_id,
                            user_id: *user_id.as_uuid(),
                            form,
                            upload_ids,
                            revision: 1,
                            updated_at: saved_at,
                        })
                        .returning(DraftRow::as_returning())
                        .get_result(&mut conn)
                        .await;
                match inserted {
                    Ok(row) => Ok(row_to_draft(row)),
                    Err(error) if is_unique_violation(&error) => {
                        // A draft already exists; the saver's view is stale.
                        let actual = self
                            .current_revision(ticket_id, user_id)
                            .await?
                            .unwrap_or(0);
                        Err(DraftRepositoryError::revision_mismatch(0, actual))
                    }
                    Err(error) => Err(map_diesel_error(error)),
                }
            }
            Some(expected) => {
                let mut conn = self.pool.get().await.map_err(map_pool_error)?;
                let updated: Option<DraftRow> = diesel::update(
                    canvass_drafts::table.filter(
                        canvass_drafts::ticket_id
                            .eq(ticket_id)
                            .and(canvass_drafts::user_id.eq(user_id.as_uuid()))
                            .and(canvass_drafts::revision.eq(expected)),
                    ),
                )
                .set((
                    canvass_drafts::form.eq(form),
                    canvass_drafts::upload_ids.eq(upload_ids),
                    canvass_drafts::revision.eq(expected + 1),
                    canvass_drafts::updated_at.eq(saved_at),
                ))
                .returning(DraftRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;

                match updated {
                    Some(row) => Ok(row_to_draft(row)),
                    None => {
                        let actual = self
                            .current_revision(ticket_id, user_id)
                            .await?
                            .unwrap_or(0);
                        Err(DraftRepositoryError::revision_mismatch(expected, actual))
                    }
                }
            }
        }
    }

    async fn delete(
        &self,
        ticket_id: Uuid,
        user_id: &UserId,
    ) -> Result<bool, DraftRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            canvass_drafts::table.filter(
                canvass_drafts::ticket_id
                    .eq(ticket_id)
                    .and(canvass_drafts::user_id.eq(user_id.as_uuid())),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
