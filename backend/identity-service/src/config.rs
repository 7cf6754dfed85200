//! Configuration management for Identity Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use identity_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("listening on {}:{}", settings.server.host, settings.server.port);
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_env: String,
    pub jwt: JwtSettings,
    pub store: StoreSettings,
    pub database: Option<DatabaseSettings>,
    pub server: ServerSettings,
    pub cors: CorsSettings,
}

impl Settings {
    /// Load settings from environment variables, reading `.env` first if present
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let store = StoreSettings::from_env()?;
        let database = match store.backend {
            StoreBackend::Postgres => Some(DatabaseSettings::from_env()?),
            StoreBackend::Memory => None,
        };

        Ok(Settings {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            jwt: JwtSettings::from_env()?,
            store,
            database,
            server: ServerSettings::from_env()?,
            cors: CorsSettings::from_env(),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

/// Token signing settings
#[derive(Clone)]
pub struct JwtSettings {
    pub signing_key: String,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let signing_key = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if signing_key.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        Ok(Self { signing_key })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{}'", other),
        }
    }
}

/// Account store selection and per-call deadline
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub call_timeout_ms: u64,
}

impl StoreSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "postgres".to_string())
                .parse()?,
            call_timeout_ms: env::var("STORE_CALL_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid STORE_CALL_TIMEOUT_MS")?,
        })
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// HTTP server settings (timeouts in seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub client_request_timeout: u64,
    pub keep_alive: u64,
    pub shutdown_timeout: u64,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        let workers = match env::var("SERVER_WORKERS") {
            Ok(value) => Some(value.parse().context("Invalid SERVER_WORKERS")?),
            Err(_) => None,
        };

        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            workers,
            client_request_timeout: env::var("SERVER_CLIENT_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid SERVER_CLIENT_REQUEST_TIMEOUT")?,
            keep_alive: env::var("SERVER_KEEP_ALIVE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid SERVER_KEEP_ALIVE")?,
            shutdown_timeout: env::var("SERVER_SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid SERVER_SHUTDOWN_TIMEOUT")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    fn from_env() -> Self {
        let origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self {
            allowed_origins: origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}
