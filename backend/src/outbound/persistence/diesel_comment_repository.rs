//! PostgreSQL-backed `CommentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::ports::{CommentListCursor, CommentRepository, CommentRepositoryError};
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::{CommentRow, NewCommentRow};
use super::pool::DbPool;
use super::schema::comments;

impl_error_mappers!(CommentRepositoryError);

/// Diesel-backed implementation of the `CommentRepository` port.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain comment.
fn row_to_comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        ticket_id: row.ticket_id,
        author_id: UserId::from_uuid(row.author_id),
        body: row.body,
        reply_to: row.reply_to,
        edited: row.edited,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        if let Some(parent_id) = comment.reply_to {
            let parent_exists: i64 = comments::table
                .filter(
                    comments::id
                        .eq(parent_id)
                        .and(comments::ticket_id.eq(comment.ticket_id)),
                )
                .count()
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            if parent_exists == 0 {
                return Err(CommentRepositoryError::parent_mismatch(
                    parent_id.to_string(),
                ));
            }
        }

        diesel::insert_into(comments::table)
            .values(NewCommentRow {
                id: comment.id,
                ticket_id: comment.ticket_id,
                author_id: *comment.author_id.as_uuid(),
                body: &comment.body,
                reply_to: comment.reply_to,
                created_at: comment.created_at,
                updated_at: comment.updated_at,
            })
            .execute(&mut conn)
            .await
            .map_err(|error| {
                // A parent deleted between the check and the insert trips
                // the FK instead; report it the same way.
                if matches!(
                    error,
                    diesel::result::Error::DatabaseError(
                        DatabaseErrorKind::ForeignKeyViolation,
                        _
                    )
                ) {
                    CommentRepositoryError::parent_mismatch(
                        comment
                            .reply_to
                            .map(|id| id.to_string())
                            .unwrap_or_default(),
                    )
                } else {
                    map_diesel_error(error)
                }
            })?;
        Ok(())
    }

    async fn page_for_ticket(
        &self,
        ticket_id: Uuid,
        cursor: Option<CommentListCursor>,
        limit: i64,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = comments::table
            .filter(comments::ticket_id.eq(ticket_id))
            .into_boxed();
        if let Some(cursor) = cursor {
            query = query.filter(
                comments::created_at.gt(cursor.created_at).or(comments::created_at
                    .eq(cursor.created_at)
                    .and(comments::id.gt(cursor.id))),
            );
        }

        let rows: Vec<CommentRow> = query
            .order((comments::created_at.asc(), comments::id.asc()))
            .limit(limit)
            .select(CommentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_comment).collect())
    }

    async fn find(
        &self,
        comment_id: Uuid,
    ) -> Result<Option<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CommentRow> = comments::table
            .filter(comments::id.eq(comment_id))
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_comment))
    }

    async fn update_body(
        &self,
        comment_id: Uuid,
        body: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Comment, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CommentRow> = diesel::update(
            comments::table.filter(comments::id.eq(comment_id)),
        )
        .set((
            comments::body.eq(body),
            comments::edited.eq(true),
            comments::updated_at.eq(edited_at),
        ))
        .returning(CommentRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        row.map(row_to_comment)
            .ok_or_else(|| CommentRepositoryError::not_found(comment_id.to_string()))
    }

    async fn delete(&self, comment_id: Uuid) -> Result<bool, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted =
            diesel::delete(comments::table.filter(comments::id.eq(comment_id)))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
