//! PostgreSQL-backed `CanvassRepository` implementation using Diesel ORM.
//!
//! `submit` is the atomicity boundary for canvass submission: the status
//! compare-and-set, form and attachment rows, pending-upload consumption,
//! approval flips, history row, and draft cleanup commit or roll back as
//! one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::approval::ApprovalStatus;
use crate::domain::canvass::{
    AttachmentKind, CanvassAttachment, CanvassForm, PendingUpload,
};
use crate::domain::ports::{CanvassRepository, CanvassRepositoryError};
use crate::domain::ticket::TicketStatus;
use crate::domain::user::UserId;

use super::diesel_helpers::impl_error_mappers;
use super::models::{
    CanvassAttachmentRow, CanvassFormRow, NewCanvassAttachmentRow, NewCanvassFormRow,
    NewPendingUploadRow, NewStatusHistoryRow, PendingUploadRow,
};
use super::pool::DbPool;
use super::schema::{
    approvals, canvass_attachments, canvass_drafts, canvass_forms, pending_uploads,
    ticket_status_history, tickets,
};

impl_error_mappers!(CanvassRepositoryError);

/// Diesel-backed implementation of the `CanvassRepository` port.
#[derive(Clone)]
pub struct DieselCanvassRepository {
    pool: DbPool,
}

impl DieselCanvassRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert an upload row to its domain form.
fn row_to_upload(row: PendingUploadRow) -> Result<PendingUpload, CanvassRepositoryError> {
    let kind = AttachmentKind::parse(&row.kind)
        .map_err(|err| CanvassRepositoryError::query(format!("corrupt upload row: {err}")))?;
    Ok(PendingUpload {
        id: row.id,
        ticket_id: row.ticket_id,
        uploaded_by: UserId::from_uuid(row.uploaded_by),
        kind,
        file_name: row.file_name,
        content_type: row.content_type,
        size_bytes: row.size_bytes,
        checksum_hex: row.checksum_hex,
        storage_key: row.storage_key,
        created_at: row.created_at,
    })
}

/// Convert an attachment row to its domain form.
fn row_to_attachment(
    row: CanvassAttachmentRow,
) -> Result<CanvassAttachment, CanvassRepositoryError> {
    let kind = AttachmentKind::parse(&row.kind).map_err(|err| {
        CanvassRepositoryError::query(format!("corrupt attachment row: {err}"))
    })?;
    Ok(CanvassAttachment {
        id: row.id,
        form_id: row.form_id,
        kind,
        file_name: row.file_name,
        content_type: row.content_type,
        size_bytes: row.size_bytes,
        checksum_hex: row.checksum_hex,
        storage_key: row.storage_key,
        created_at: row.created_at,
    })
}

fn row_to_form(
    row: CanvassFormRow,
    attachments: Vec<CanvassAttachment>,
) -> CanvassForm {
    CanvassForm {
        id: row.id,
        ticket_id: row.ticket_id,
        submitted_by: UserId::from_uuid(row.submitted_by),
        supplier_name: row.supplier_name,
        rf_date_received: row.rf_date_received,
        lead_time_days: row.lead_time_days,
        payment_terms: row.payment_terms,
        total_amount_cents: row.total_amount_cents,
        created_at: row.created_at,
        attachments,
    }
}

/// Transaction-internal failures that need to survive the rollback.
enum TxError {
    Db(diesel::result::Error),
    TicketNotFound,
    StatusConflict { actual: String },
    UploadMissing { upload_id: Uuid },
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

#[async_trait]
impl CanvassRepository for DieselCanvassRepository {
    async fn register_upload(
        &self,
        upload: &PendingUpload,
    ) -> Result<(), CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(pending_uploads::table)
            .values(NewPendingUploadRow {
                id: upload.id,
                ticket_id: upload.ticket_id,
                uploaded_by: *upload.uploaded_by.as_uuid(),
                kind: upload.kind.as_str(),
                file_name: &upload.file_name,
                content_type: &upload.content_type,
                size_bytes: upload.size_bytes,
                checksum_hex: &upload.checksum_hex,
                storage_key: &upload.storage_key,
                created_at: upload.created_at,
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn resolve_uploads(
        &self,
        ticket_id: Uuid,
        uploaded_by: &UserId,
        upload_ids: &[Uuid],
    ) -> Result<Vec<PendingUpload>, CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PendingUploadRow> = pending_uploads::table
            .filter(
                pending_uploads::id
                    .eq_any(upload_ids)
                    .and(pending_uploads::ticket_id.eq(ticket_id))
                    .and(pending_uploads::uploaded_by.eq(uploaded_by.as_uuid())),
            )
            .order(pending_uploads::created_at.asc())
            .select(PendingUploadRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if let Some(missing) = upload_ids
            .iter()
            .find(|id| !rows.iter().any(|row| row.id == **id))
        {
            return Err(CanvassRepositoryError::upload_missing(missing.to_string()));
        }
        rows.into_iter().map(row_to_upload).collect()
    }

    async fn submit(
        &self,
        form: &CanvassForm,
        upload_ids: &[Uuid],
        expected_status: TicketStatus,
    ) -> Result<(), CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let result = conn
            .transaction::<(), TxError, _>(|conn| {
                async move {
                    let updated = diesel::update(
                        tickets::table.filter(
                            tickets::id
                                .eq(form.ticket_id)
                                .and(tickets::status.eq(expected_status.as_str())),
                        ),
                    )
                    .set((
                        tickets::status
                            .eq(TicketStatus::ForReviewOfSubmissions.as_str()),
                        tickets::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        let actual: Option<String> = tickets::table
                            .filter(tickets::id.eq(form.ticket_id))
                            .select(tickets::status)
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(match actual {
                            None => TxError::TicketNotFound,
                            Some(actual) => TxError::StatusConflict { actual },
                        });
                    }

                    let consumed: Vec<Uuid> = diesel::delete(
                        pending_uploads::table.filter(
                            pending_uploads::id
                                .eq_any(upload_ids)
                                .and(pending_uploads::ticket_id.eq(form.ticket_id))
                                .and(
                                    pending_uploads::uploaded_by
                                        .eq(form.submitted_by.as_uuid()),
                                ),
                        ),
                    )
                    .returning(pending_uploads::id)
                    .get_results(conn)
                    .await?;
                    if let Some(missing) = upload_ids
                        .iter()
                        .find(|id| !consumed.contains(id))
                    {
                        return Err(TxError::UploadMissing {
                            upload_id: *missing,
                        });
                    }

                    diesel::insert_into(canvass_forms::table)
                        .values(NewCanvassFormRow {
                            id: form.id,
                            ticket_id: form.ticket_id,
                            submitted_by: *form.submitted_by.as_uuid(),
                            supplier_name: &form.supplier_name,
                            rf_date_received: form.rf_date_received,
                            lead_time_days: form.lead_time_days,
                            payment_terms: &form.payment_terms,
                            total_amount_cents: form.total_amount_cents,
                            created_at: form.created_at,
                        })
                        .execute(conn)
                        .await?;

                    let attachment_rows: Vec<NewCanvassAttachmentRow<'_>> = form
                        .attachments
                        .iter()
                        .map(|attachment| NewCanvassAttachmentRow {
                            id: attachment.id,
                            form_id: attachment.form_id,
                            kind: attachment.kind.as_str(),
                            file_name: &attachment.file_name,
                            content_type: &attachment.content_type,
                            size_bytes: attachment.size_bytes,
                            checksum_hex: &attachment.checksum_hex,
                            storage_key: &attachment.storage_key,
                            created_at: attachment.created_at,
                        })
                        .collect();
                    diesel::insert_into(canvass_attachments::table)
                        .values(&attachment_rows)
                        .execute(conn)
                        .await?;

                    diesel::update(
                        approvals::table.filter(
                            approvals::ticket_id.eq(form.ticket_id).and(
                                approvals::status.eq(ApprovalStatus::Pending.as_str()),
                            ),
                        ),
                    )
                    .set((
                        approvals::status
                            .eq(ApprovalStatus::AwaitingAction.as_str()),
                        approvals::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;

                    diesel::insert_into(ticket_status_history::table)
                        .values(NewStatusHistoryRow {
                            id: Uuid::new_v4(),
                            ticket_id: form.ticket_id,
                            status: TicketStatus::ForReviewOfSubmissions.as_str(),
                            changed_by: *form.submitted_by.as_uuid(),
                            note: None,
                        })
                        .execute(conn)
                        .await?;

                    diesel::delete(
                        canvass_drafts::table.filter(
                            canvass_drafts::ticket_id.eq(form.ticket_id).and(
                                canvass_drafts::user_id.eq(form.submitted_by.as_uuid()),
                            ),
                        ),
                    )
                    .execute(conn)
                    .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(TxError::TicketNotFound) => Err(CanvassRepositoryError::ticket_not_found(
                form.ticket_id.to_string(),
            )),
            Err(TxError::StatusConflict { actual }) => Err(
                CanvassRepositoryError::status_conflict(expected_status.as_str(), actual),
            ),
            Err(TxError::UploadMissing { upload_id }) => Err(
                CanvassRepositoryError::upload_missing(upload_id.to_string()),
            ),
            Err(TxError::Db(error)) => Err(map_diesel_error(error)),
        }
    }

    async fn list_for_ticket(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<CanvassForm>, CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let form_rows: Vec<CanvassFormRow> = canvass_forms::table
            .filter(canvass_forms::ticket_id.eq(ticket_id))
            .order(canvass_forms::created_at.desc())
            .select(CanvassFormRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let form_ids: Vec<Uuid> = form_rows.iter().map(|row| row.id).collect();
        let attachment_rows: Vec<CanvassAttachmentRow> = canvass_attachments::table
            .filter(canvass_attachments::form_id.eq_any(&form_ids))
            .order(canvass_attachments::created_at.asc())
            .select(CanvassAttachmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut attachments_by_form: std::collections::HashMap<Uuid, Vec<CanvassAttachment>> =
            std::collections::HashMap::new();
        for row in attachment_rows {
            let form_id = row.form_id;
            attachments_by_form
                .entry(form_id)
                .or_default()
                .push(row_to_attachment(row)?);
        }

        Ok(form_rows
            .into_iter()
            .map(|row| {
                let attachments = attachments_by_form.remove(&row.id).unwrap_or_default();
                row_to_form(row, attachments)
            })
            .collect())
    }

    async fn find_attachment(
        &self,
        attachment_id: Uuid,
    ) -> Result<Option<(CanvassAttachment, Uuid)>, CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(CanvassAttachmentRow, Uuid)> = canvass_attachments::table
            .inner_join(canvass_forms::table)
            .filter(canvass_attachments::id.eq(attachment_id))
            .select((
                CanvassAttachmentRow::as_select(),
                canvass_forms::ticket_id,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(row, ticket_id)| Ok((row_to_attachment(row)?, ticket_id)))
            .transpose()
    }

    async fn stale_uploads(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<PendingUpload>, CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PendingUploadRow> = pending_uploads::table
            .filter(pending_uploads::created_at.lt(older_than))
            .order(pending_uploads::created_at.asc())
            .select(PendingUploadRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_upload).collect()
    }

    async fn delete_upload(&self, upload_id: Uuid) -> Result<bool, CanvassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            pending_uploads::table.filter(pending_uploads::id.eq(upload_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
