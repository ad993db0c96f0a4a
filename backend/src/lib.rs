//! Canvassing backend library modules.
//!
//! A procurement workflow service: purchase tickets routed through
//! canvassing, reviewer sign-off, and manager approval, with drafts,
//! comments, notifications, and a dashboard. Layout follows a hexagonal
//! architecture: [`domain`] holds entities, ports, and workflow services;
//! [`inbound`] adapts HTTP and WebSocket transports; [`outbound`] adapts
//! PostgreSQL, object storage, and realtime fan-out; [`server`] wires it
//! all together from environment configuration.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
