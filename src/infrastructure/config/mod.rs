//! Command-line and environment configuration.
//!
//! Every flag has an environment fallback (`SNIPPETBOX_*`), so the binary can
//! be configured from a `.env` file loaded before parsing.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Secrets shorter than this are rejected
pub const MIN_SECRET_BYTES: usize = 16;

/// Development signing key; publicly known, so never fit for production
pub const DEFAULT_SECRET: &str = "s6Ndh+nzHbS*+9Pk8qGWhTzbpa@ge";

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Raw command-line flags
#[derive(Clone, Parser)]
#[command(name = "snippetbox", version, about = "Share short text snippets")]
pub struct Cli {
    /// HTTP network address
    #[arg(long, env = "SNIPPETBOX_ADDR", default_value = "0.0.0.0:4000")]
    pub addr: SocketAddr,

    /// Postgres data source name; in-memory stores are used when absent
    #[arg(long, env = "SNIPPETBOX_DSN", hide_env_values = true)]
    pub dsn: Option<String>,

    /// Key used to sign session cookies
    #[arg(
        long,
        env = "SNIPPETBOX_SECRET",
        default_value = DEFAULT_SECRET,
        hide_env_values = true
    )]
    pub secret: String,

    /// Absolute session lifetime in hours
    #[arg(long, env = "SNIPPETBOX_SESSION_LIFETIME_HOURS", default_value_t = 12)]
    pub session_lifetime_hours: i64,

    /// Allow session cookies over plain HTTP (local development only)
    #[arg(long, env = "SNIPPETBOX_INSECURE_COOKIES")]
    pub insecure_cookies: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "SNIPPETBOX_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Directory served under /static
    #[arg(long, env = "SNIPPETBOX_STATIC_DIR", default_value = "./ui/static")]
    pub static_dir: PathBuf,

    #[arg(long, env = "SNIPPETBOX_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub db_max_connections: u32,

    #[arg(long, env = "SNIPPETBOX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("secret must be at least {MIN_SECRET_BYTES} bytes long")]
    SecretTooShort,

    #[error("session lifetime must be positive, got {0} hours")]
    InvalidSessionLifetime(i64),

    #[error("request timeout must be positive")]
    InvalidRequestTimeout,
}

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub request_timeout: Duration,
    pub static_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub dsn: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Clone)]
pub struct SessionSettings {
    pub secret: String,
    pub lifetime: chrono::Duration,
    pub secure: bool,
    pub sweep_interval: Duration,
}

impl SessionSettings {
    /// Whether cookies are signed with the built-in development key
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .field("secure", &self.secure)
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl TryFrom<Cli> for AppConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        if cli.secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort);
        }
        if cli.session_lifetime_hours <= 0 {
            return Err(ConfigError::InvalidSessionLifetime(cli.session_lifetime_hours));
        }
        if cli.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout);
        }
        let lifetime = chrono::Duration::try_hours(cli.session_lifetime_hours)
            .ok_or(ConfigError::InvalidSessionLifetime(cli.session_lifetime_hours))?;

        Ok(Self {
            server: ServerConfig {
                addr: cli.addr,
                request_timeout: Duration::from_secs(cli.request_timeout_secs),
                static_dir: cli.static_dir,
            },
            database: DatabaseConfig {
                dsn: cli.dsn.filter(|dsn| !dsn.trim().is_empty()),
                max_connections: cli.db_max_connections,
                acquire_timeout: Duration::from_secs(5),
            },
            session: SessionSettings {
                secret: cli.secret,
                lifetime,
                secure: !cli.insecure_cookies,
                sweep_interval: Duration::from_secs(60),
            },
            logging: LoggingConfig { format: cli.log_format },
        })
    }
}

impl AppConfig {
    /// Parse flags from the process arguments and environment
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::try_from(Cli::parse())
    }
}
