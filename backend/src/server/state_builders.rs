//! Wiring of concrete adapters into the handler state bundles.

use std::sync::Arc;

use mockable::DefaultClock;

use crate::domain::approval::ReviewService;
use crate::domain::canvass::CanvassService;
use crate::domain::ports::AttachmentStore;
use crate::domain::ticket::TicketWorkflowService;
use crate::domain::{
    CommentService, DraftService, NotificationService, PasswordLoginService,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::state::WsState;
use crate::outbound::notify::NotificationHub;
use crate::outbound::persistence::{
    DbPool, DieselApprovalRepository, DieselCanvassRepository, DieselCommentRepository,
    DieselDashboardQuery, DieselDraftRepository, DieselNotificationRepository,
    DieselTicketRepository, DieselUserRepository,
};

/// Build the HTTP and WebSocket state bundles over database-backed
/// adapters.
///
/// The returned [`WsState`] shares the notification hub that the domain
/// services publish to, so realtime pushes and the persisted feed stay in
/// sync.
#[must_use]
pub fn build_states(
    pool: DbPool,
    store: Arc<dyn AttachmentStore>,
) -> (HttpState, WsState) {
    let hub = Arc::new(NotificationHub::new());
    let clock = Arc::new(DefaultClock);

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let tickets_repo = Arc::new(DieselTicketRepository::new(pool.clone()));
    let approvals_repo = Arc::new(DieselApprovalRepository::new(pool.clone()));
    let canvass_repo = Arc::new(DieselCanvassRepository::new(pool.clone()));
    let drafts_repo = Arc::new(DieselDraftRepository::new(pool.clone()));
    let comments_repo = Arc::new(DieselCommentRepository::new(pool.clone()));
    let notifications_repo = Arc::new(DieselNotificationRepository::new(pool.clone()));
    let dashboard = Arc::new(DieselDashboardQuery::new(pool));

    let notifier = Arc::new(NotificationService::new(
        notifications_repo,
        hub.clone(),
        clock.clone(),
    ));

    let http = HttpState {
        login: Arc::new(PasswordLoginService::new(users.clone())),
        users: users.clone(),
        tickets: Arc::new(TicketWorkflowService::new(
            tickets_repo.clone(),
            approvals_repo.clone(),
            canvass_repo.clone(),
            users.clone(),
            notifier.clone(),
            clock.clone(),
        )),
        reviews: Arc::new(ReviewService::new(
            tickets_repo.clone(),
            approvals_repo,
            users.clone(),
            notifier.clone(),
            clock.clone(),
        )),
        canvass: Arc::new(CanvassService::new(
            canvass_repo,
            tickets_repo.clone(),
            users.clone(),
            store,
            notifier.clone(),
            clock.clone(),
        )),
        drafts: Arc::new(DraftService::new(
            drafts_repo,
            tickets_repo.clone(),
            users.clone(),
            clock.clone(),
        )),
        comments: Arc::new(CommentService::new(
            comments_repo,
            tickets_repo,
            users,
            notifier.clone(),
            clock,
        )),
        notifications: notifier,
        dashboard,
    };

    (http, WsState::new(hub))
}
