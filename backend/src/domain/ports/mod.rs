//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod approval_repository;
mod attachment_store;
mod canvass_repository;
mod canvass_workflow;
mod comment_repository;
mod comment_workflow;
mod dashboard_query;
mod draft_repository;
mod draft_workflow;
mod login_service;
mod notification_feed;
mod notification_publisher;
mod notification_repository;
mod review_workflow;
mod ticket_repository;
mod ticket_workflow;
mod user_repository;

#[cfg(test)]
pub use approval_repository::MockApprovalRepository;
pub use approval_repository::{ApprovalRepository, ApprovalRepositoryError};
#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError, MemoryAttachmentStore};
#[cfg(test)]
pub use canvass_repository::MockCanvassRepository;
pub use canvass_repository::{CanvassRepository, CanvassRepositoryError};
#[cfg(test)]
pub use canvass_workflow::MockCanvassWorkflow;
pub use canvass_workflow::{AttachmentDownload, CanvassWorkflow, UploadRequest};
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentListCursor, CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use comment_workflow::MockCommentWorkflow;
pub use comment_workflow::CommentWorkflow;
#[cfg(test)]
pub use dashboard_query::MockDashboardQuery;
pub use dashboard_query::{DashboardQuery, DashboardQueryError};
#[cfg(test)]
pub use draft_repository::MockDraftRepository;
pub use draft_repository::{DraftRepository, DraftRepositoryError};
#[cfg(test)]
pub use draft_workflow::MockDraftWorkflow;
pub use draft_workflow::DraftWorkflow;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FixtureLoginService, LoginService};
#[cfg(test)]
pub use notification_feed::MockNotificationFeed;
pub use notification_feed::{NotificationFeed, NotificationFeedPage};
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{NoOpNotificationPublisher, NotificationPublisher};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    NotificationListCursor, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use review_workflow::MockReviewWorkflow;
pub use review_workflow::{ReviewReceipt, ReviewWorkflow};
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{
    TicketFilter, TicketListCursor, TicketRepository, TicketRepositoryError, TicketScope,
    TransitionOutcome, TransitionRequest,
};
#[cfg(test)]
pub use ticket_workflow::MockTicketWorkflow;
pub use ticket_workflow::{TicketDetail, TicketListRequest, TicketWorkflow};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    FixtureUserRepository, UserCredentials, UserPersistenceError, UserRepository,
};
