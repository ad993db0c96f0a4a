//! Per-connection WebSocket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge. The public contract
//! pings every 5s and considers a connection idle after 10s without client
//! traffic; stored notifications arrive through the hub channel and are
//! pushed as JSON text frames. Tests shorten the intervals to speed up
//! feedback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::notification::Notification;
use crate::domain::user::UserId;
use crate::inbound::ws::messages::NotificationFrame;
use crate::outbound::notify::NotificationHub;

/// Time between heartbeats to the client.
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client.
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Drive one connection until it closes, then unsubscribe it.
pub(super) async fn handle_ws_session(
    hub: Arc<NotificationHub>,
    user_id: UserId,
    connection_id: Uuid,
    mut session: Session,
    mut stream: MessageStream,
    mut events: UnboundedReceiver<Notification>,
) {
    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    let close_reason = loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
                    debug!(user = %user_id, "ws client timed out");
                    break Some(CloseReason::from(CloseCode::Away));
                }
                if session.ping(b"").await.is_err() {
                    break None;
                }
            }
            event = events.recv() => {
                let Some(notification) = event else { break None };
                match serde_json::to_string(&NotificationFrame::from(&notification)) {
                    Ok(frame) => {
                        if session.text(frame).await.is_err() {
                            break None;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "failed to serialise notification frame");
                    }
                }
            }
            message = stream.recv() => {
                match message {
                    Some(Ok(Message::Ping(bytes))) => {
                        last_heartbeat = Instant::now();
                        if session.pong(&bytes).await.is_err() {
                            break None;
                        }
                    }
                    Some(Ok(Message::Pong(_) | Message::Text(_) | Message::Binary(_))) => {
                        last_heartbeat = Instant::now();
                    }
                    Some(Ok(Message::Close(reason))) => break reason,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        debug!(%error, "ws protocol error");
                        break Some(CloseReason::from(CloseCode::Protocol));
                    }
                    None => break None,
                }
            }
        }
    };

    hub.unsubscribe(&user_id, connection_id);
    let _closed = session.close(close_reason).await;
}
