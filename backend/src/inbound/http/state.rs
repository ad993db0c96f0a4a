//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CanvassWorkflow, CommentWorkflow, DashboardQuery, DraftWorkflow, LoginService,
    NotificationFeed, ReviewWorkflow, TicketWorkflow, UserRepository,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Authentication use-case.
    pub login: Arc<dyn LoginService>,
    /// User directory lookups.
    pub users: Arc<dyn UserRepository>,
    /// Ticket workflow use-cases.
    pub tickets: Arc<dyn TicketWorkflow>,
    /// Reviewer sign-off use-cases.
    pub reviews: Arc<dyn ReviewWorkflow>,
    /// Canvassing use-cases.
    pub canvass: Arc<dyn CanvassWorkflow>,
    /// Draft autosave use-cases.
    pub drafts: Arc<dyn DraftWorkflow>,
    /// Commenting use-cases.
    pub comments: Arc<dyn CommentWorkflow>,
    /// Notification feed use-cases.
    pub notifications: Arc<dyn NotificationFeed>,
    /// Dashboard aggregation.
    pub dashboard: Arc<dyn DashboardQuery>,
}
