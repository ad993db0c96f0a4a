//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::outbound::notify::NotificationHub;

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    /// Live-connection registry used for notification fan-out.
    pub hub: Arc<NotificationHub>,
}

impl WsState {
    /// Construct state around the shared hub.
    #[must_use]
    pub fn new(hub: Arc<NotificationHub>) -> Self {
        Self { hub }
    }
}
