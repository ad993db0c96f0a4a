//! Backend entry-point: wires REST endpoints, the notification WebSocket,
//! and OpenAPI docs.

use color_eyre::eyre::WrapErr;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use canvassing_backend::server::{ServerConfig, run};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = ServerConfig::from_env().wrap_err("configuration error")?;
    let (server, _health) = run(config).await.wrap_err("startup failed")?;
    server.await.wrap_err("server terminated abnormally")
}
