//! Request rate limiting for unauthenticated operations.
//!
//! Requests are identified by their fingerprint (see
//! [`radar_core::fingerprint`]) and counted under
//! `"<namespace>:<action>:<fingerprint>"` by a [`CountingService`]. The
//! counting service owns window and consistency semantics; this module only
//! composes the key and interprets the verdict.

pub mod http;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use radar_core::error::CoreError;
use radar_core::fingerprint::rate_limit_key;
use serde::{Deserialize, Serialize};

use crate::config::{RateLimitBackend, ServerConfig};

pub use self::http::HttpCountingService;
pub use self::memory::InMemoryCountingService;

/// Message returned to rate-limited callers. Deliberately uniform.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limited, please try again later";

/// One counting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitRequest {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    /// Window hint in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u64>,
    /// Expiration hint in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
}

impl LimitRequest {
    pub fn new(key: String) -> Self {
        Self {
            key,
            weight: None,
            window: None,
            expiration: None,
        }
    }
}

/// The counting service's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitResponse {
    pub success: bool,
    #[serde(default)]
    pub remaining: Option<u64>,
    /// Epoch milliseconds at which the window resets.
    #[serde(default)]
    pub reset: Option<i64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CountingError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Counting service returned HTTP {0}")]
    HttpStatus(u16),
}

/// External counter deciding whether a keyed request may proceed.
#[async_trait]
pub trait CountingService: Send + Sync {
    async fn limit(&self, request: &LimitRequest) -> Result<LimitResponse, CountingError>;
}

/// Keys requests into a [`CountingService`].
pub struct RateLimiter {
    namespace: String,
    service: Arc<dyn CountingService>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(namespace: impl Into<String>, service: Arc<dyn CountingService>) -> Self {
        Self {
            namespace: namespace.into(),
            service,
        }
    }

    /// Count one `action` request from `fingerprint`.
    ///
    /// Fails open when the counting service itself is unavailable.
    pub async fn check(&self, action: &str, fingerprint: &str) -> Result<(), CoreError> {
        let request = LimitRequest::new(rate_limit_key(&self.namespace, action, fingerprint));

        match self.service.limit(&request).await {
            Ok(verdict) if verdict.success => Ok(()),
            Ok(verdict) => {
                tracing::info!(
                    action,
                    remaining = verdict.remaining,
                    reset = verdict.reset,
                    "Request rate limited"
                );
                Err(CoreError::RateLimited(RATE_LIMITED_MESSAGE.to_string()))
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "Counting service unavailable, allowing request");
                Ok(())
            }
        }
    }
}

/// Whether requests are rate limited at all.
#[derive(Debug)]
pub enum RateLimitPolicy {
    Enabled(RateLimiter),
    /// Development mode or no counting service configured.
    Disabled,
}

impl RateLimitPolicy {
    /// Build the policy described by the server configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, CountingError> {
        if config.environment.is_development() {
            tracing::info!("Development environment, rate limiting disabled");
            return Ok(Self::Disabled);
        }

        let service: Arc<dyn CountingService> = match &config.rate_limit.backend {
            RateLimitBackend::Remote { url, token } => Arc::new(HttpCountingService::new(
                url.clone(),
                token.clone(),
                Duration::from_secs(5),
            )?),
            RateLimitBackend::Local {
                max_requests,
                window,
            } => Arc::new(InMemoryCountingService::new(*max_requests, *window)),
            RateLimitBackend::Unconfigured => {
                tracing::warn!("No counting service configured, rate limiting disabled");
                return Ok(Self::Disabled);
            }
        };

        Ok(Self::Enabled(RateLimiter::new(
            config.rate_limit.namespace.clone(),
            service,
        )))
    }

    pub async fn check(&self, action: &str, fingerprint: &str) -> Result<(), CoreError> {
        match self {
            Self::Enabled(limiter) => limiter.check(action, fingerprint).await,
            Self::Disabled => Ok(()),
        }
    }
}
