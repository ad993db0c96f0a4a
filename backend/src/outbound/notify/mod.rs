//! Realtime notification delivery adapters.

mod hub;

pub use hub::NotificationHub;
