use std::time::Duration;

use mansei_store::TtlConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// How long an untouched booking record survives (default: `1800`).
    pub booking_idle_ttl_secs: u64,
    /// Grace window after a booking record is read before the sweeper may
    /// remove it (default: `600`).
    pub booking_read_grace_secs: u64,
    /// How long an untouched mirrored quote survives (default: `3600`).
    pub quote_idle_ttl_secs: u64,
    /// Retention window after a mirrored quote is first retrieved
    /// (default: `600`).
    pub quote_retention_secs: u64,
    /// Interval between store eviction sweeps (default: `60`).
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `HOST`                     | `0.0.0.0`                |
    /// | `PORT`                     | `3000`                   |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                     |
    /// | `BOOKING_IDLE_TTL_SECS`    | `1800`                   |
    /// | `BOOKING_READ_GRACE_SECS`  | `600`                    |
    /// | `QUOTE_IDLE_TTL_SECS`      | `3600`                   |
    /// | `QUOTE_RETENTION_SECS`     | `600`                    |
    /// | `SWEEP_INTERVAL_SECS`      | `60`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_u64("SHUTDOWN_TIMEOUT_SECS", 30),
            booking_idle_ttl_secs: env_u64("BOOKING_IDLE_TTL_SECS", 1800),
            booking_read_grace_secs: env_u64("BOOKING_READ_GRACE_SECS", 600),
            quote_idle_ttl_secs: env_u64("QUOTE_IDLE_TTL_SECS", 3600),
            quote_retention_secs: env_u64("QUOTE_RETENTION_SECS", 600),
            sweep_interval_secs: env_u64("SWEEP_INTERVAL_SECS", 60),
        }
    }

    /// Eviction settings for the booking event store.
    pub fn booking_ttl(&self) -> TtlConfig {
        TtlConfig {
            idle_ttl: Duration::from_secs(self.booking_idle_ttl_secs),
            read_grace: Duration::from_secs(self.booking_read_grace_secs),
        }
    }

    /// Eviction settings for the server-side quote mirror.
    pub fn quote_ttl(&self) -> TtlConfig {
        TtlConfig {
            idle_ttl: Duration::from_secs(self.quote_idle_ttl_secs),
            read_grace: Duration::from_secs(self.quote_retention_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"))
}
