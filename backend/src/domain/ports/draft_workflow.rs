//! Driving port for canvass draft autosave.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::draft::CanvassDraft;
use crate::domain::error::Error;
use crate::domain::user::UserId;

/// Domain use-case port for draft autosave.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftWorkflow: Send + Sync {
    /// Fetch the actor's draft for a ticket, if any.
    async fn get(&self, actor: &UserId, ticket_id: Uuid)
    -> Result<Option<CanvassDraft>, Error>;

    /// Save the actor's draft under a revision check.
    async fn save(
        &self,
        actor: &UserId,
        ticket_id: Uuid,
        form: Value,
        upload_ids: Vec<Uuid>,
        expected_revision: Option<i32>,
    ) -> Result<CanvassDraft, Error>;

    /// Discard the actor's draft, reporting whether one existed.
    async fn discard(&self, actor: &UserId, ticket_id: Uuid) -> Result<bool, Error>;
}
