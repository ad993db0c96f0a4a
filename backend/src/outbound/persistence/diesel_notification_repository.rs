//! PostgreSQL-backed `NotificationRepository` implementation using Diesel
//! ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification};
use crate::domain::ports::{
    NotificationListCursor, NotificationRepository, NotificationRepositoryError,
};
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::DbPool;
use super::schema::{notifications, tickets};

impl_error_mappers!(NotificationRepositoryError);

/// Diesel-backed implementation of the `NotificationRepository` port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve display names for the given tickets in one query.
    async fn ticket_names(
        &self,
        conn: &mut diesel_async::pooled_connection::bb8::PooledConnection<
            '_,
            diesel_async::AsyncPgConnection,
        >,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, NotificationRepositoryError> {
        let rows: Vec<(Uuid, String)> = tickets::table
            .filter(tickets::id.eq_any(ids))
            .select((tickets::id, tickets::name))
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().collect())
    }
}

fn row_to_notification(row: NotificationRow, ticket_name: String) -> Notification {
    Notification {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        ticket_id: row.ticket_id,
        ticket_name,
        message: row.message,
        read: row.is_read,
        created_at: row.created_at,
    }
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert_many(
        &self,
        batch: &[NewNotification],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<NewNotificationRow<'_>> = batch
            .iter()
            .map(|item| NewNotificationRow {
                id: Uuid::new_v4(),
                user_id: *item.user_id.as_uuid(),
                ticket_id: item.ticket_id,
                message: &item.message,
                created_at,
            })
            .collect();

        let stored: Vec<NotificationRow> = diesel::insert_into(notifications::table)
            .values(&rows)
            .returning(NotificationRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ticket_ids: Vec<Uuid> = stored.iter().map(|row| row.ticket_id).collect();
        let names = self.ticket_names(&mut conn, &ticket_ids).await?;

        Ok(stored
            .into_iter()
            .map(|row| {
                let name = names.get(&row.ticket_id).cloned().unwrap_or_default();
                row_to_notification(row, name)
            })
            .collect())
    }

    async fn page_for_user(
        &self,
        user_id: &UserId,
        cursor: Option<NotificationListCursor>,
        limit: i64,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = notifications::table
            .inner_join(tickets::table)
            .filter(notifications::user_id.eq(user_id.as_uuid()))
            .into_boxed();
        if let Some(cursor) = cursor {
            query = query.filter(
                notifications::created_at
                    .lt(cursor.created_at)
                    .or(notifications::created_at
                        .eq(cursor.created_at)
                        .and(notifications::id.lt(cursor.id))),
            );
        }

        let rows: Vec<(NotificationRow, String)> = query
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit)
            .select((NotificationRow::as_select(), tickets::name))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(row, name)| row_to_notification(row, name))
            .collect())
    }

    async fn unread_count(
        &self,
        user_id: &UserId,
    ) -> Result<i64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        notifications::table
            .filter(
                notifications::user_id
                    .eq(user_id.as_uuid())
                    .and(notifications::is_read.eq(false)),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: &UserId,
    ) -> Result<(), NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notifications::table.filter(
                notifications::id
                    .eq(notification_id)
                    .and(notifications::user_id.eq(user_id.as_uuid())),
            ),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(NotificationRepositoryError::not_found(
                notification_id.to_string(),
            ));
        }
        Ok(())
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
    ) -> Result<i64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            notifications::table.filter(
                notifications::user_id
                    .eq(user_id.as_uuid())
                    .and(notifications::is_read.eq(false)),
            ),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        i64::try_from(updated)
            .map_err(|_| NotificationRepositoryError::query("row count overflow"))
    }
}
