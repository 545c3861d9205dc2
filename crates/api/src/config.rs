use std::time::Duration;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Production,
    /// Ingestion credentials and rate limiting are bypassed.
    Development,
}

impl AppEnvironment {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Which counting service backs the rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Remote HTTP counting service.
    Remote { url: String, token: Option<String> },
    /// In-process fixed window, for single-instance deployments.
    Local { max_requests: u64, window: Duration },
    /// No counting service; requests are never limited.
    Unconfigured,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Key prefix, e.g. `rate_limit` in `rate_limit:<action>:<fingerprint>`.
    pub namespace: String,
    pub backend: RateLimitBackend,
}

impl RateLimitConfig {
    fn from_env() -> Self {
        let namespace =
            std::env::var("RATE_LIMIT_NAMESPACE").unwrap_or_else(|_| "rate_limit".into());

        let backend = if let Ok(url) = std::env::var("RATE_LIMIT_URL") {
            RateLimitBackend::Remote {
                url,
                token: std::env::var("RATE_LIMIT_TOKEN").ok(),
            }
        } else if let Ok(max) = std::env::var("RATE_LIMIT_LOCAL_MAX") {
            let max_requests: u64 = max
                .parse()
                .expect("RATE_LIMIT_LOCAL_MAX must be a valid u64");
            let window_secs: u64 = std::env::var("RATE_LIMIT_LOCAL_WINDOW_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .expect("RATE_LIMIT_LOCAL_WINDOW_SECS must be a valid u64");
            RateLimitBackend::Local {
                max_requests,
                window: Duration::from_secs(window_secs),
            }
        } else {
            RateLimitBackend::Unconfigured
        };

        Self { namespace, backend }
    }
}

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
    pub environment: AppEnvironment,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret the detector presents on ingestion calls.
    pub ingest_api_key: Option<String>,
    /// Public site URL used for links in notifications.
    pub public_base_url: String,
    /// Timeout for a single chat webhook call (default: `10`).
    pub chat_webhook_timeout_secs: u64,
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `APP_ENV`                   | `production`               |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `INGEST_API_KEY`            | unset (ingestion rejected) |
    /// | `PUBLIC_BASE_URL`           | `https://radar.iodev.org`  |
    /// | `CHAT_WEBHOOK_TIMEOUT_SECS` | `10`                       |
    /// | `RATE_LIMIT_*`              | see [`RateLimitBackend`]   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let environment = AppEnvironment::from_env_value(
            &std::env::var("APP_ENV").unwrap_or_else(|_| "production".into()),
        );

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let ingest_api_key = std::env::var("INGEST_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "https://radar.iodev.org".into());

        let chat_webhook_timeout_secs: u64 = std::env::var("CHAT_WEBHOOK_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("CHAT_WEBHOOK_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            environment,
            cors_origins,
            request_timeout_secs,
            ingest_api_key,
            public_base_url,
            chat_webhook_timeout_secs,
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_to_production() {
        assert_eq!(AppEnvironment::from_env_value(""), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_env_value("staging"), AppEnvironment::Production);
        assert_eq!(AppEnvironment::from_env_value("Development"), AppEnvironment::Development);
        assert!(AppEnvironment::from_env_value("dev").is_development());
    }
}
