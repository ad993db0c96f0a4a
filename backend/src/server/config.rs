//! Environment-driven server configuration.
//!
//! Everything configurable comes from environment variables, matching the
//! deployment model (container + injected secrets):
//!
//! | Variable | Default | Purpose |
//! |---|---|---|
//! | `DATABASE_URL` | — (required) | PostgreSQL connection string |
//! | `DB_MAX_CONNECTIONS` | `10` | async pool size |
//! | `BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `SESSION_KEY_FILE` | `/var/run/secrets/session_key` | cookie key material |
//! | `SESSION_ALLOW_EPHEMERAL` | unset | `1` allows a generated key (dev) |
//! | `SESSION_COOKIE_SECURE` | `1` | `0` disables the Secure flag |
//! | `SESSION_SAME_SITE` | `lax` | `lax`, `strict`, or `none` |
//! | `STORAGE_BACKEND` | `fs` | `fs` or `s3` |
//! | `STORAGE_FS_ROOT` | `./data/attachments` | blob root for `fs` |
//! | `S3_BUCKET` / `S3_REGION` / `S3_ENDPOINT` / `S3_ACCESS_KEY_ID` / `S3_SECRET_ACCESS_KEY` | — | settings for `s3` |

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::outbound::storage::S3Settings;

/// Errors raised while assembling configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("missing required environment variable: {name}")]
    Missing {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but unusable.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
    /// The session key could not be loaded.
    #[error("failed to load session key from {path}: {message}")]
    SessionKey {
        /// File path that was tried.
        path: String,
        /// Underlying failure.
        message: String,
    },
}

/// Where attachment blobs live.
pub enum StorageSettings {
    /// Local directory (development, single-node deployments).
    Fs {
        /// Root directory for blob keys.
        root: String,
    },
    /// S3-compatible object storage.
    S3(S3Settings),
}

impl StorageSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let backend =
            env::var("STORAGE_BACKEND").unwrap_or_else(|_| "fs".to_owned());
        match backend.as_str() {
            "fs" => Ok(Self::Fs {
                root: env::var("STORAGE_FS_ROOT")
                    .unwrap_or_else(|_| "./data/attachments".to_owned()),
            }),
            "s3" => Ok(Self::S3(S3Settings {
                bucket: require("S3_BUCKET")?,
                region: require("S3_REGION")?,
                endpoint: env::var("S3_ENDPOINT").ok(),
                access_key_id: require("S3_ACCESS_KEY_ID")?,
                secret_access_key: require("S3_SECRET_ACCESS_KEY")?,
            })),
            other => Err(ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                message: format!("expected fs or s3, got {other}"),
            }),
        }
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing { name })
}

/// Fully resolved server configuration.
pub struct ServerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Async pool size.
    pub db_max_connections: u32,
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
    /// Session cookie signing/encryption key.
    pub session_key: Key,
    /// Whether the session cookie carries the `Secure` flag.
    pub cookie_secure: bool,
    /// Session cookie `SameSite` policy.
    pub same_site: SameSite,
    /// Attachment blob storage settings.
    pub storage: StorageSettings,
}

impl ServerConfig {
    /// Assemble configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing or malformed variables, or an
    /// unreadable session key file outside dev mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = require("DATABASE_URL")?;

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "DB_MAX_CONNECTIONS",
                message: format!("not a number: {raw}"),
            })?,
            Err(_) => 10,
        };

        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            message: format!("not a socket address: {bind_raw}"),
        })?;

        let session_key = load_session_key()?;
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v != "0")
            .unwrap_or(true);
        let same_site = parse_same_site()?;
        let storage = StorageSettings::from_env()?;

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr,
            session_key,
            cookie_secure,
            same_site,
            storage,
        })
    }
}

fn parse_same_site() -> Result<SameSite, ConfigError> {
    match env::var("SESSION_SAME_SITE") {
        Err(_) => Ok(SameSite::Lax),
        Ok(raw) => match raw.to_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(ConfigError::Invalid {
                name: "SESSION_SAME_SITE",
                message: format!("expected lax, strict, or none, got {other}"),
            }),
        },
    }
}

/// Load the session cookie key from `SESSION_KEY_FILE`.
///
/// The raw key material is zeroized after derivation, and only a SHA-256
/// fingerprint prefix is logged so operators can confirm which key is
/// active without exposing it. Debug builds (or `SESSION_ALLOW_EPHEMERAL=1`)
/// fall back to a generated key so local runs need no secret plumbing —
/// sessions then reset on every restart.
fn load_session_key() -> Result<Key, ConfigError> {
    let key_path = env::var("SESSION_KEY_FILE")
        .unwrap_or_else(|_| "/var/run/secrets/session_key".to_owned());

    match std::fs::read(&key_path) {
        Ok(mut bytes) => {
            let fingerprint = hex::encode(Sha256::digest(&bytes));
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            let prefix = fingerprint.get(..16).unwrap_or(&fingerprint);
            info!(path = %key_path, fingerprint = %prefix, "session key loaded");
            Ok(key)
        }
        Err(error) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, %error, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(ConfigError::SessionKey {
                    path: key_path,
                    message: error.to_string(),
                })
            }
        }
    }
}
