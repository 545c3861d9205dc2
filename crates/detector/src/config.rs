use std::time::Duration;

/// Default polling interval in milliseconds.
const DEFAULT_FETCH_INTERVAL_MS: u64 = 60_000;

/// Default Hetzner Cloud API base URL.
pub const DEFAULT_HETZNER_API_BASE: &str = "https://api.hetzner.cloud/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Where and how detected changes are relayed.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub url: String,
    pub token: Option<String>,
}

/// Detector configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub hetzner_api_token: String,
    pub hetzner_api_base: String,
    pub fetch_interval: Duration,
    /// `None` when `INGEST_URL` is unset.
    pub relay: Option<RelayConfig>,
    /// `None` when `ANALYTICS_URL` is unset.
    pub analytics: Option<AnalyticsConfig>,
}

impl DetectorConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default                          |
    /// |---------------------|----------------------------------|
    /// | `HETZNER_API_TOKEN` | required                         |
    /// | `HETZNER_API_BASE`  | `https://api.hetzner.cloud/v1`   |
    /// | `FETCH_INTERVAL_MS` | `60000`                          |
    /// | `INGEST_URL`        | unset (relay disabled)           |
    /// | `INGEST_API_KEY`    | required when `INGEST_URL` set   |
    /// | `ANALYTICS_URL`     | unset (analytics disabled)       |
    /// | `ANALYTICS_TOKEN`   | unset                            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| get(var).filter(|v| !v.trim().is_empty());

        let hetzner_api_token =
            non_empty("HETZNER_API_TOKEN").ok_or(ConfigError::Missing("HETZNER_API_TOKEN"))?;

        let hetzner_api_base = non_empty("HETZNER_API_BASE")
            .unwrap_or_else(|| DEFAULT_HETZNER_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let fetch_interval_ms = match non_empty("FETCH_INTERVAL_MS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid {
                    var: "FETCH_INTERVAL_MS",
                    value,
                })?,
            None => DEFAULT_FETCH_INTERVAL_MS,
        };

        let relay = match non_empty("INGEST_URL") {
            Some(url) => Some(RelayConfig {
                url,
                api_key: non_empty("INGEST_API_KEY").ok_or(ConfigError::Missing("INGEST_API_KEY"))?,
            }),
            None => None,
        };

        let analytics = non_empty("ANALYTICS_URL").map(|url| AnalyticsConfig {
            url,
            token: non_empty("ANALYTICS_TOKEN"),
        });

        Ok(Self {
            hetzner_api_token,
            hetzner_api_base,
            fetch_interval: Duration::from_millis(fetch_interval_ms),
            relay,
            analytics,
        })
    }
}
