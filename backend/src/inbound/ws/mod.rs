//! WebSocket inbound adapter pushing stored notifications to clients.
//!
//! Responsibilities:
//! - authenticate the upgrade via the session cookie
//! - validate the `Origin` header against the configured allow-list
//! - register the connection with the notification hub and drive it

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::Payload;
use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::{debug, error};
use url::Url;

mod session;

pub mod messages;
pub mod state;

use crate::inbound::http::session::SessionContext;

/// Handle WebSocket upgrade for the notification stream.
#[get("/ws/notifications")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    http_session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let user_id = http_session.require_user_id()?;

    if let Some(origin) = req.headers().get(ORIGIN) {
        validate_origin(origin)?;
    }

    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;
    let (connection_id, events) = state.hub.subscribe(&user_id);
    debug!(user = %user_id, connection = %connection_id, "ws notification stream opened");

    let hub = state.hub.clone();
    actix_web::rt::spawn(session::handle_ws_session(
        hub,
        user_id,
        connection_id,
        session,
        message_stream,
        events,
    ));
    Ok(response)
}

/// Reject upgrades from origins outside `WS_ALLOWED_ORIGINS`.
///
/// The allow-list is a comma-separated set of origins; when unset, any
/// syntactically valid origin is accepted (the session cookie is the
/// authentication boundary).
fn validate_origin(origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        error!(%error, "failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(%error, "failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    let Ok(allowed) = std::env::var("WS_ALLOWED_ORIGINS") else {
        return Ok(());
    };
    let matches_allowed = allowed
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| {
            Url::parse(candidate)
                .map(|candidate| {
                    candidate.origin() == origin.origin()
                })
                .unwrap_or(false)
        });
    if matches_allowed {
        Ok(())
    } else {
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
