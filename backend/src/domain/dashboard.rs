//! Dashboard aggregates: status counts and per-role action queues.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ticket::TicketStatus;

/// Count of visible tickets in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    /// The status being counted.
    pub status: TicketStatus,
    /// Number of visible tickets in that status.
    pub count: i64,
}

/// Per-actor dashboard aggregation.
///
/// Each field is the product of a single grouped query; the original
/// system's per-reviewer read loop is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Visible tickets grouped by status.
    pub status_counts: Vec<StatusCount>,
    /// Items waiting on the current actor (role-dependent).
    pub awaiting_my_action: i64,
    /// Unread notifications for the current actor.
    pub unread_notifications: i64,
}

impl DashboardSummary {
    /// Total visible tickets across all statuses.
    #[must_use]
    pub fn total_tickets(&self) -> i64 {
        self.status_counts.iter().map(|entry| entry.count).sum()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn totals_sum_all_status_buckets() {
        let summary = DashboardSummary {
            status_counts: vec![
                StatusCount {
                    status: TicketStatus::ForCanvass,
                    count: 3,
                },
                StatusCount {
                    status: TicketStatus::Done,
                    count: 7,
                },
            ],
            awaiting_my_action: 2,
            unread_notifications: 5,
        };
        assert_eq!(summary.total_tickets(), 10);
    }
}
