//! PostgreSQL-backed `TicketRepository` implementation using Diesel ORM.
//!
//! Ticket creation (sequence allocation, approval rows, shares, first
//! history entry) and status transitions (compare-and-set write, history
//! row, flag updates) each run inside a single database transaction, which
//! is what makes the domain's workflow invariants hold under concurrency.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    TicketFilter, TicketListCursor, TicketRepository, TicketRepositoryError, TicketScope,
    TransitionOutcome, TransitionRequest,
};
use crate::domain::approval::ApprovalStatus;
use crate::domain::ticket::{
    ItemDetails, NewTicket, StatusHistoryEntry, Ticket, TicketName, TicketStatus,
};
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::{
    NewApprovalRow, NewStatusHistoryRow, NewTicketRow, NewTicketShareRow, StatusHistoryRow,
    TicketRow,
};
use super::pool::DbPool;
use super::schema::{approvals, ticket_sequences, ticket_shares, ticket_status_history, tickets};

impl_error_mappers!(TicketRepositoryError);

/// Diesel-backed implementation of the `TicketRepository` port.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Transaction-internal failures that need to survive the rollback.
enum TxError {
    Db(diesel::result::Error),
    NotFound,
    Lost { actual: String },
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

/// Assemble a domain ticket from its row plus loaded reviewer/share ids.
fn row_to_ticket(
    row: TicketRow,
    reviewers: Vec<UserId>,
    shared_with: Vec<UserId>,
) -> Result<Ticket, TicketRepositoryError> {
    let name = TicketName::try_from(row.name)
        .map_err(|err| TicketRepositoryError::query(format!("corrupt ticket row: {err}")))?;
    let status = TicketStatus::parse(&row.status)
        .map_err(|err| TicketRepositoryError::query(format!("corrupt ticket row: {err}")))?;
    Ok(Ticket {
        id: row.id,
        name,
        item: ItemDetails {
            name: row.item_name,
            description: row.item_description,
            quantity: row.quantity,
            specifications: row.specifications,
        },
        status,
        created_by: UserId::from_uuid(row.created_by),
        is_revised: row.is_revised,
        reviewers,
        shared_with,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_history(row: StatusHistoryRow) -> Result<StatusHistoryEntry, TicketRepositoryError> {
    let status = TicketStatus::parse(&row.status)
        .map_err(|err| TicketRepositoryError::query(format!("corrupt history row: {err}")))?;
    Ok(StatusHistoryEntry {
        id: row.id,
        ticket_id: row.ticket_id,
        status,
        changed_by: UserId::from_uuid(row.changed_by),
        note: row.note,
        created_at: row.created_at,
    })
}

fn is_foreign_key_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

impl DieselTicketRepository {
    /// Load reviewer and share ids for a batch of tickets with two grouped
    /// queries.
    async fn load_members(
        &self,
        conn: &mut diesel_async::pooled_connection::bb8::PooledConnection<
            '_,
            diesel_async::AsyncPgConnection,
        >,
        ids: &[Uuid],
    ) -> Result<(HashMap<Uuid, Vec<UserId>>, HashMap<Uuid, Vec<UserId>>), TicketRepositoryError>
    {
        let reviewer_rows: Vec<(Uuid, Uuid)> = approvals::table
            .filter(approvals::ticket_id.eq_any(ids))
            .order(approvals::created_at.asc())
            .select((approvals::ticket_id, approvals::reviewer_id))
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        let share_rows: Vec<(Uuid, Uuid)> = ticket_shares::table
            .filter(ticket_shares::ticket_id.eq_any(ids))
            .order(ticket_shares::created_at.asc())
            .select((ticket_shares::ticket_id, ticket_shares::user_id))
            .load(conn)
            .await
            .map_err(map_diesel_error)?;

        let mut reviewers: HashMap<Uuid, Vec<UserId>> = HashMap::new();
        for (ticket_id, reviewer_id) in reviewer_rows {
            reviewers
                .entry(ticket_id)
                .or_default()
                .push(UserId::from_uuid(reviewer_id));
        }
        let mut shares: HashMap<Uuid, Vec<UserId>> = HashMap::new();
        for (ticket_id, user_id) in share_rows {
            shares
                .entry(ticket_id)
                .or_default()
                .push(UserId::from_uuid(user_id));
        }
        Ok((reviewers, shares))
    }
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn create(
        &self,
        new: &NewTicket,
        created_by: &UserId,
        on_date: NaiveDate,
    ) -> Result<Ticket, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction::<TicketRow, diesel::result::Error, _>(|conn| {
                async move {
                    let sequence: i32 = diesel::insert_into(ticket_sequences::table)
                        .values((
                            ticket_sequences::sequence_date.eq(on_date),
                            ticket_sequences::next_value.eq(1),
                        ))
                        .on_conflict(ticket_sequences::sequence_date)
                        .do_update()
                        .set(
                            ticket_sequences::next_value
                                .eq(ticket_sequences::next_value + 1),
                        )
                        .returning(ticket_sequences::next_value)
                        .get_result(conn)
                        .await?;

                    let name =
                        TicketName::compose(u32::try_from(sequence).unwrap_or(0), on_date);
                    let ticket_id = Uuid::new_v4();
                    let row: TicketRow = diesel::insert_into(tickets::table)
                        .values(NewTicketRow {
                            id: ticket_id,
                            name: name.as_ref(),
                            item_name: &new.item.name,
                            item_description: &new.item.description,
                            quantity: new.item.quantity,
                            specifications: new.item.specifications.as_deref(),
                            status: TicketStatus::ForCanvass.as_str(),
                            created_by: *created_by.as_uuid(),
                        })
                        .returning(TicketRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let approval_rows: Vec<NewApprovalRow<'_>> = new
                        .reviewers
                        .iter()
                        .map(|reviewer| NewApprovalRow {
                            id: Uuid::new_v4(),
                            ticket_id,
                            reviewer_id: *reviewer.as_uuid(),
                            status: ApprovalStatus::Pending.as_str(),
                        })
                        .collect();
                    diesel::insert_into(approvals::table)
                        .values(&approval_rows)
                        .execute(conn)
                        .await?;

                    if !new.shared_with.is_empty() {
                        let share_rows: Vec<NewTicketShareRow> = new
                            .shared_with
                            .iter()
                            .map(|user| NewTicketShareRow {
                                ticket_id,
                                user_id: *user.as_uuid(),
                            })
                            .collect();
                        diesel::insert_into(ticket_shares::table)
                            .values(&share_rows)
                            .on_conflict_do_nothing()
                            .execute(conn)
                            .await?;
                    }

                    diesel::insert_into(ticket_status_history::table)
                        .values(NewStatusHistoryRow {
                            id: Uuid::new_v4(),
                            ticket_id,
                            status: TicketStatus::ForCanvass.as_str(),
                            changed_by: *created_by.as_uuid(),
                            note: None,
                        })
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        row_to_ticket(row, new.reviewers.clone(), new.shared_with.clone())
    }

    async fn find(&self, ticket_id: Uuid) -> Result<Option<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TicketRow> = tickets::table
            .filter(tickets::id.eq(ticket_id))
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(row) = row else { return Ok(None) };
        let (mut reviewers, mut shares) = self.load_members(&mut conn, &[ticket_id]).await?;
        row_to_ticket(
            row,
            reviewers.remove(&ticket_id).unwrap_or_default(),
            shares.remove(&ticket_id).unwrap_or_default(),
        )
        .map(Some)
    }

    async fn list(
        &self,
        filter: &TicketFilter,
        cursor: Option<TicketListCursor>,
        limit: i64,
    ) -> Result<Vec<Ticket>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = tickets::table.into_boxed();
        match &filter.scope {
            TicketScope::All => {}
            TicketScope::CreatedBy(user) => {
                query = query.filter(tickets::created_by.eq(*user.as_uuid()));
            }
            TicketScope::VisibleTo(user) => {
                let uid = *user.as_uuid();
                let shared = ticket_shares::table
                    .filter(ticket_shares::user_id.eq(uid))
                    .select(ticket_shares::ticket_id);
                let reviewing = approvals::table
                    .filter(approvals::reviewer_id.eq(uid))
                    .select(approvals::ticket_id);
                query = query.filter(
                    tickets::created_by
                        .eq(uid)
                        .or(tickets::id.eq_any(shared))
                        .or(tickets::id.eq_any(reviewing)),
                );
            }
        }
        if let Some(status) = filter.status {
            query = query.filter(tickets::status.eq(status.as_str()));
        }
        if let Some(cursor) = cursor {
            query = query.filter(
                tickets::created_at.lt(cursor.created_at).or(tickets::created_at
                    .eq(cursor.created_at)
                    .and(tickets::id.lt(cursor.id))),
            );
        }

        let rows: Vec<TicketRow> = query
            .order((tickets::created_at.desc(), tickets::id.desc()))
            .limit(limit)
            .select(TicketRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let (mut reviewers, mut shares) = self.load_members(&mut conn, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let id = row.id;
                row_to_ticket(
                    row,
                    reviewers.remove(&id).unwrap_or_default(),
                    shares.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }

    async fn transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result = conn
            .transaction::<(), TxError, _>(|conn| {
                async move {
                    let target = tickets::table.filter(
                        tickets::id
                            .eq(request.ticket_id)
                            .and(tickets::status.eq(request.expected.as_str())),
                    );
                    let updated = if request.mark_revised {
                        diesel::update(target)
                            .set((
                                tickets::status.eq(request.next.as_str()),
                                tickets::is_revised.eq(true),
                                tickets::updated_at.eq(diesel::dsl::now),
                            ))
                            .execute(conn)
                            .await?
                    } else {
                        diesel::update(target)
                            .set((
                                tickets::status.eq(request.next.as_str()),
                                tickets::updated_at.eq(diesel::dsl::now),
                            ))
                            .execute(conn)
                            .await?
                    };

                    if updated == 0 {
                        let actual: Option<String> = tickets::table
                            .filter(tickets::id.eq(request.ticket_id))
                            .select(tickets::status)
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(match actual {
                            None => TxError::NotFound,
                            Some(actual) => TxError::Lost { actual },
                        });
                    }

                    diesel::insert_into(ticket_status_history::table)
                        .values(NewStatusHistoryRow {
                            id: Uuid::new_v4(),
                            ticket_id: request.ticket_id,
                            status: request.next.as_str(),
                            changed_by: *request.actor.as_uuid(),
                            note: request.note.as_deref(),
                        })
                        .execute(conn)
                        .await?;

                    if request.reset_approvals {
                        diesel::update(
                            approvals::table
                                .filter(approvals::ticket_id.eq(request.ticket_id)),
                        )
                        .set((
                            approvals::status.eq(ApprovalStatus::Pending.as_str()),
                            approvals::review_date.eq(None::<chrono::DateTime<chrono::Utc>>),
                            approvals::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;
                    }

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(TransitionOutcome::Applied),
            Err(TxError::Lost { actual }) => {
                let actual = TicketStatus::parse(&actual).map_err(|err| {
                    TicketRepositoryError::query(format!("corrupt ticket row: {err}"))
                })?;
                Ok(TransitionOutcome::Lost { actual })
            }
            Err(TxError::NotFound) => Err(TicketRepositoryError::not_found(
                request.ticket_id.to_string(),
            )),
            Err(TxError::Db(error)) => Err(map_diesel_error(error)),
        }
    }

    async fn share(
        &self,
        ticket_id: Uuid,
        users: &[UserId],
    ) -> Result<Vec<UserId>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<NewTicketShareRow> = users
            .iter()
            .map(|user| NewTicketShareRow {
                ticket_id,
                user_id: *user.as_uuid(),
            })
            .collect();

        let added: Vec<Uuid> = diesel::insert_into(ticket_shares::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .returning(ticket_shares::user_id)
            .get_results(&mut conn)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    TicketRepositoryError::not_found(ticket_id.to_string())
                } else {
                    map_diesel_error(error)
                }
            })?;

        Ok(added.into_iter().map(UserId::from_uuid).collect())
    }

    async fn history(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StatusHistoryRow> = ticket_status_history::table
            .filter(ticket_status_history::ticket_id.eq(ticket_id))
            .order(ticket_status_history::created_at.asc())
            .select(StatusHistoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_history).collect()
    }
}
