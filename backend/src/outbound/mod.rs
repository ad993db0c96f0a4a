//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing
//! concrete implementations of domain port traits for infrastructure
//! concerns:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **storage**: object storage for attachment blobs via OpenDAL
//! - **notify**: in-process realtime notification fan-out
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod notify;
pub mod persistence;
pub mod storage;
