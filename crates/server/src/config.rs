//! Environment-driven configuration.

use auth::DEFAULT_TOKEN_TTL_HOURS;
use tracing::warn;

/// Signing secret used when `JWT_SECRET` is absent. Fine for local
/// development, a liability anywhere else, hence the loud warning.
const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP/WebSocket listen port.
    pub port: u16,
    /// Prometheus exporter port.
    pub metrics_port: u16,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
}

impl Config {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3009);

        let metrics_port = std::env::var("METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9094);

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set, using the development default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);

        Self {
            port,
            metrics_port,
            jwt_secret,
            token_ttl_hours,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3009,
            metrics_port: 9094,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}
