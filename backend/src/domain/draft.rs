//! Canvass drafts: autosaved pre-submission state, one per (ticket, user).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::UserId;
use uuid::Uuid;

/// Autosaved canvass form state.
///
/// ## Invariants
/// - At most one draft exists per (ticket, user).
/// - `revision` starts at 1 and increments on every accepted save; saves
///   carrying a stale `expected_revision` are rejected so a slow autosave
///   can never clobber a newer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvassDraft {
    /// Ticket the draft belongs to.
    pub ticket_id: Uuid,
    /// Draft owner.
    pub user_id: UserId,
    /// Opaque client form snapshot.
    pub form: Value,
    /// Monotonic save counter.
    pub revision: i32,
    /// Last save timestamp.
    pub updated_at: DateTime<Utc>,
    /// Upload ids referenced by the draft, newest save wins.
    pub upload_ids: Vec<Uuid>,
}

impl CanvassDraft {
    /// First revision of a brand new draft.
    #[must_use]
    pub fn initial(
        ticket_id: Uuid,
        user_id: UserId,
        form: Value,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticket_id,
            user_id,
            form,
            revision: 1,
            updated_at: saved_at,
            upload_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn initial_drafts_start_at_revision_one() {
        let draft = CanvassDraft::initial(
            Uuid::new_v4(),
            UserId::random(),
            json!({ "supplierName": "Acme" }),
            Utc::now(),
        );
        assert_eq!(draft.revision, 1);
        assert!(draft.upload_ids.is_empty());
    }
}
