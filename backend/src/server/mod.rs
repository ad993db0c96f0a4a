//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ConfigError, ServerConfig, StorageSettings};
pub use state_builders::build_states;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use tracing::info;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::ports::AttachmentStore;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::{canvass, comments, dashboard, drafts, notifications, reviews, tickets, users};
use crate::inbound::ws;
use crate::middleware::Trace;
use crate::outbound::persistence::{DbPool, migrations};
use crate::outbound::storage::OpendalAttachmentStore;

/// Errors raised while bringing the server up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration was missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Migrations failed to apply.
    #[error(transparent)]
    Migrations(#[from] migrations::MigrationError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] crate::outbound::persistence::PoolError),
    /// The attachment store could not be opened.
    #[error("failed to open attachment store: {0}")]
    Storage(crate::domain::ports::AttachmentStoreError),
    /// The HTTP listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was tried.
        addr: std::net::SocketAddr,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A blocking startup task panicked.
    #[error("startup task failed: {0}")]
    Join(String),
}

/// Open the configured attachment store.
///
/// # Errors
///
/// Returns [`StartupError::Storage`] when the backend cannot be opened.
pub fn open_store(
    settings: &StorageSettings,
) -> Result<Arc<dyn AttachmentStore>, StartupError> {
    let store = match settings {
        StorageSettings::Fs { root } => {
            OpendalAttachmentStore::new_fs(root).map_err(StartupError::Storage)?
        }
        StorageSettings::S3(settings) => {
            OpendalAttachmentStore::new_s3(settings).map_err(StartupError::Storage)?
        }
    };
    Ok(Arc::new(store))
}

/// Apply migrations, build the pool and adapters, and start the server.
///
/// The returned health state starts not-ready; it flips once the listener
/// is bound so orchestration readiness probes only pass when the service
/// can actually answer.
///
/// # Errors
///
/// Returns [`StartupError`] when any startup stage fails.
pub async fn run(config: ServerConfig) -> Result<(Server, web::Data<HealthState>), StartupError> {
    let database_url = config.database_url.clone();
    tokio::task::spawn_blocking(move || migrations::run_pending(&database_url))
        .await
        .map_err(|err| StartupError::Join(err.to_string()))??;

    let pool = DbPool::connect(&config.database_url, config.db_max_connections).await?;
    let store = open_store(&config.storage)?;
    let (http_state, ws_state) = build_states(pool, store);

    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);
    let ws_state = web::Data::new(ws_state);

    let key = config.session_key.clone();
    let cookie_secure = config.cookie_secure;
    let same_site = config.same_site;

    #[cfg(feature = "metrics")]
    let prometheus = PrometheusMetricsBuilder::new("canvassing")
        .endpoint("/metrics")
        .build()
        .map_err(|err| StartupError::Join(format!("metrics registration failed: {err}")))?;

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(same_site)
            .build();

        let api = web::scope("/api/v1")
            .service(users::login)
            .service(users::logout)
            .service(users::me)
            .service(users::list_users)
            .service(tickets::create_ticket)
            .service(tickets::list_tickets)
            .service(tickets::get_ticket)
            .service(tickets::apply_ticket_action)
            .service(tickets::share_ticket)
            .service(tickets::ticket_history)
            .service(reviews::list_approvals)
            .service(reviews::record_review)
            .service(canvass::stage_upload)
            .service(canvass::submit_canvass)
            .service(canvass::download_attachment)
            .service(canvass::sweep_uploads)
            .service(drafts::get_draft)
            .service(drafts::save_draft)
            .service(drafts::discard_draft)
            .service(comments::list_comments)
            .service(comments::post_comment)
            .service(comments::edit_comment)
            .service(comments::delete_comment)
            .service(notifications::list_notifications)
            .service(notifications::mark_read)
            .service(notifications::mark_all_read)
            .service(dashboard::dashboard);

        let app = App::new()
            .app_data(http_state.clone())
            .app_data(ws_state.clone())
            .app_data(server_health_state.clone())
            .wrap(session)
            .wrap(Trace)
            .service(api)
            .service(ws::ws_entry)
            .service(ready)
            .service(live);

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        #[cfg(debug_assertions)]
        let app = app.service(
            SwaggerUi::new("/docs/{_:.*}")
                .url("/api-docs/openapi.json", crate::doc::ApiDoc::openapi()),
        );

        app
    })
    .bind(config.bind_addr)
    .map_err(|source| StartupError::Bind {
        addr: config.bind_addr,
        source,
    })?;

    info!(addr = %config.bind_addr, "http server bound");
    health_state.mark_ready();
    Ok((server.run(), health_state))
}
