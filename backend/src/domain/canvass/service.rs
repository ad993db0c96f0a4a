//! Canvassing service implementing the driving port.
//!
//! Uploads are staged: the blob goes to object storage and a pending row
//! records it, but nothing durable references the ticket until the
//! submission transaction commits. A submission that fails therefore leaves
//! at worst an unreferenced blob, which the orphan sweep reclaims.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::canvass::{
    CanvassAttachment, CanvassForm, CanvassValidationError, MAX_UPLOAD_BYTES, NewCanvassForm,
    PendingUpload, validate_attachment_set, validate_file_name,
};
use crate::domain::error::Error;
use crate::domain::notification::NewNotification;
use crate::domain::notifier::NotificationService;
use crate::domain::ports::{
    AttachmentDownload, AttachmentStore, AttachmentStoreError, CanvassRepository,
    CanvassRepositoryError, CanvassWorkflow, TicketRepository, UploadRequest, UserRepository,
};
use crate::domain::ticket::{Ticket, TicketStatus, map_ticket_error, map_user_error};
use crate::domain::user::{Role, User, UserId};

/// Canvassing service over canvass persistence and blob storage.
#[derive(Clone)]
pub struct CanvassService {
    canvass: Arc<dyn CanvassRepository>,
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    store: Arc<dyn AttachmentStore>,
    notifier: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl CanvassService {
    /// Create a service over the given ports.
    #[must_use]
    pub fn new(
        canvass: Arc<dyn CanvassRepository>,
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        store: Arc<dyn AttachmentStore>,
        notifier: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            canvass,
            tickets,
            users,
            store,
            notifier,
            clock,
        }
    }

    async fn require_actor(&self, actor: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(actor)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("unknown user"))
    }

    async fn require_visible_ticket(
        &self,
        actor: &User,
        ticket_id: Uuid,
    ) -> Result<Ticket, Error> {
        let ticket = self
            .tickets
            .find(ticket_id)
            .await
            .map_err(map_ticket_error)?
            .ok_or_else(|| Error::not_found("ticket not found"))?;
        if !ticket.visible_to(&actor.id, actor.role) {
            return Err(Error::not_found("ticket not found"));
        }
        Ok(ticket)
    }

    fn require_canvasser(actor: &User) -> Result<(), Error> {
        if matches!(actor.role, Role::Purchaser | Role::Admin) {
            Ok(())
        } else {
            Err(Error::forbidden("only purchasers canvass tickets"))
        }
    }
}

fn map_canvass_error(error: CanvassRepositoryError) -> Error {
    match error {
        CanvassRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("canvass store unavailable: {message}"))
        }
        CanvassRepositoryError::Query { message } => {
            Error::internal(format!("canvass store error: {message}"))
        }
        CanvassRepositoryError::TicketNotFound { .. } => Error::not_found("ticket not found"),
        CanvassRepositoryError::UploadMissing { upload_id } => {
            Error::invalid_request("referenced upload not found")
                .with_details(json!({ "uploadId": upload_id, "code": "upload_missing" }))
        }
        CanvassRepositoryError::StatusConflict { expected, actual } => {
            Error::conflict("ticket status changed").with_details(json!({
                "expected": expected,
                "actual": actual,
                "code": "status_conflict",
            }))
        }
    }
}

fn map_store_error(error: AttachmentStoreError) -> Error {
    match error {
        AttachmentStoreError::Io { message } => {
            Error::service_unavailable(format!("attachment store unavailable: {message}"))
        }
        AttachmentStoreError::NotFound { key } => {
            Error::not_found(format!("attachment blob missing: {key}"))
        }
    }
}

#[async_trait]
impl CanvassWorkflow for CanvassService {
    async fn register_upload(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        request: UploadRequest,
    ) -> Result<PendingUpload, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;
        Self::require_canvasser(&actor_user)?;

        if ticket.status != TicketStatus::WorkInProgress {
            return Err(Error::conflict(format!(
                "uploads are only accepted while canvassing (status: {})",
                ticket.status
            )));
        }

        let file_name = validate_file_name(&request.file_name)
            .map_err(|err| Error::invalid_request(err.to_string()))?
            .to_owned();
        let too_large = CanvassValidationError::UploadTooLarge {
            max: MAX_UPLOAD_BYTES,
        };
        let size = i64::try_from(request.bytes.len())
            .map_err(|_| Error::invalid_request(too_large.to_string()))?;
        if size > MAX_UPLOAD_BYTES {
            return Err(Error::invalid_request(too_large.to_string()));
        }
        if size == 0 {
            return Err(Error::invalid_request("upload is empty"));
        }

        let id = Uuid::new_v4();
        let checksum_hex = hex::encode(Sha256::digest(&request.bytes));
        let storage_key = format!("tickets/{ticket_id}/uploads/{id}");

        self.store
            .put(&storage_key, request.bytes)
            .await
            .map_err(map_store_error)?;

        let upload = PendingUpload {
            id,
            ticket_id,
            uploaded_by: actor.clone(),
            kind: request.kind,
            file_name,
            content_type: request.content_type,
            size_bytes: size,
            checksum_hex,
            storage_key: storage_key.clone(),
            created_at: self.clock.utc(),
        };

        if let Err(error) = self.canvass.register_upload(&upload).await {
            // The blob is unreachable without its row; reclaim it eagerly.
            if let Err(cleanup) = self.store.delete(&storage_key).await {
                warn!(%cleanup, key = %storage_key, "failed to reclaim orphaned blob");
            }
            return Err(map_canvass_error(error));
        }

        Ok(upload)
    }

    async fn submit(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        form: NewCanvassForm,
        upload_ids: Vec<Uuid>,
    ) -> Result<CanvassForm, Error> {
        let actor_user = self.require_actor(actor).await?;
        let ticket = self.require_visible_ticket(&actor_user, ticket_id).await?;
        Self::require_canvasser(&actor_user)?;

        if ticket.status != TicketStatus::WorkInProgress {
            return Err(Error::conflict(format!(
                "ticket is not being canvassed (status: {})",
                ticket.status
            )));
        }

        let uploads = self
            .canvass
            .resolve_uploads(ticket_id, actor, &upload_ids)
            .await
            .map_err(map_canvass_error)?;
        validate_attachment_set(&uploads)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let now = self.clock.utc();
        let form_id = Uuid::new_v4();
        let attachments = uploads
            .into_iter()
            .map(|upload| CanvassAttachment {
                id: Uuid::new_v4(),
                form_id,
                kind: upload.kind,
                file_name: upload.file_name,
                content_type: upload.content_type,
                size_bytes: upload.size_bytes,
                checksum_hex: upload.checksum_hex,
                storage_key: upload.storage_key,
                created_at: now,
            })
            .collect();

        let stored = CanvassForm {
            id: form_id,
            ticket_id,
            submitted_by: actor.clone(),
            supplier_name: form.supplier_name,
            rf_date_received: form.rf_date_received,
            lead_time_days: form.lead_time_days,
            payment_terms: form.payment_terms,
            total_amount_cents: form.total_amount_cents,
            created_at: now,
            attachments,
        };

        self.canvass
            .submit(&stored, &upload_ids, TicketStatus::WorkInProgress)
            .await
            .map_err(map_canvass_error)?;
        info!(ticket = %ticket.name, form = %form_id, "canvass form submitted");

        let message = format!(
            "{} submitted a canvass form for ticket {}",
            actor_user.display_name, ticket.name
        );
        let batch =
            NewNotification::fan_out(&ticket.participants(), actor, ticket.id, &message);
        self.notifier.notify(batch).await;

        Ok(stored)
    }

    async fn open_attachment(
        &self,
        actor: &UserId,
        attachment_id: Uuid,
    ) -> Result<AttachmentDownload, Error> {
        let actor_user = self.require_actor(actor).await?;
        let (attachment, ticket_id) = self
            .canvass
            .find_attachment(attachment_id)
            .await
            .map_err(map_canvass_error)?
            .ok_or_else(|| Error::not_found("attachment not found"))?;
        self.require_visible_ticket(&actor_user, ticket_id).await?;

        let bytes = self
            .store
            .read(&attachment.storage_key)
            .await
            .map_err(map_store_error)?;
        Ok(AttachmentDownload { attachment, bytes })
    }

    async fn sweep_orphan_uploads(
        &self,
        actor: &UserId,
        older_than: DateTime<Utc>,
    ) -> Result<u64, Error> {
        let actor_user = self.require_actor(actor).await?;
        if actor_user.role != Role::Admin {
            return Err(Error::forbidden("only admins sweep orphaned uploads"));
        }

        let stale = self
            .canvass
            .stale_uploads(older_than)
            .await
            .map_err(map_canvass_error)?;

        let mut reclaimed = 0_u64;
        for upload in stale {
            match self.store.delete(&upload.storage_key).await {
                Ok(()) | Err(AttachmentStoreError::NotFound { .. }) => {}
                Err(error) => {
                    warn!(%error, key = %upload.storage_key, "orphan blob delete failed");
                    continue;
                }
            }
            if self
                .canvass
                .delete_upload(upload.id)
                .await
                .map_err(map_canvass_error)?
            {
                reclaimed += 1;
            }
        }
        info!(reclaimed, "orphan upload sweep finished");
        Ok(reclaimed)
    }
}
