//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types; business rules stay in the domain.
//!   The one structural responsibility they do own is transaction scoping:
//!   workflow writes that must be atomic (ticket creation, status
//!   transitions, canvass submission) commit inside a single database
//!   transaction here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed to
//!   the domain layer.
//! - **Strongly typed errors**: All database errors are mapped to domain
//!   port error types.

pub(crate) mod diesel_helpers;
mod diesel_approval_repository;
mod diesel_canvass_repository;
mod diesel_comment_repository;
mod diesel_dashboard_query;
mod diesel_draft_repository;
mod diesel_notification_repository;
mod diesel_ticket_repository;
mod diesel_user_repository;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_approval_repository::DieselApprovalRepository;
pub use diesel_canvass_repository::DieselCanvassRepository;
pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_dashboard_query::DieselDashboardQuery;
pub use diesel_draft_repository::DieselDraftRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolError};
