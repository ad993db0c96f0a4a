//! Domain entities, ports, and workflow services.
//!
//! Purpose: hold the procurement workflow's business rules — the ticket
//! status state machine, reviewer aggregation, canvass submission
//! atomicity, draft revisions — behind transport-agnostic types. Inbound
//! adapters (HTTP, WebSocket) call the driving ports exposed from
//! [`ports`]; outbound adapters implement the driven ports.

pub mod approval;
pub mod auth;
pub mod canvass;
pub mod comment;
mod comment_service;
pub mod dashboard;
pub mod draft;
mod draft_service;
pub mod error;
mod listing;
mod login;
pub mod notification;
mod notifier;
pub mod ports;
pub mod ticket;
pub mod user;

pub use self::comment_service::CommentService;
pub use self::draft_service::DraftService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::login::PasswordLoginService;
pub use self::notifier::NotificationService;
pub use self::user::{DisplayName, EmailAddress, Role, User, UserId, UserValidationError};

/// Convenient domain result alias.
pub type ApiResult<T> = Result<T, Error>;
