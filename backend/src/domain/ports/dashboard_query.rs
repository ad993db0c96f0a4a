//! Port for dashboard aggregation queries.

use async_trait::async_trait;

use crate::domain::dashboard::DashboardSummary;
use crate::domain::user::{Role, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by dashboard query adapters.
    pub enum DashboardQueryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "dashboard query connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "dashboard query failed: {message}",
    }
}

/// Port for per-actor dashboard aggregation.
///
/// Implementations compute each count family with one grouped query,
/// scoped by the viewer's visibility rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    /// Aggregate the viewer's dashboard.
    async fn summary(
        &self,
        viewer: &UserId,
        role: Role,
    ) -> Result<DashboardSummary, DashboardQueryError>;
}
