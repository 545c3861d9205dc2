//! Digest delivery to chat webhooks (Discord-compatible).
//!
//! [`ChatWebhookChannel`] POSTs `{"content": "<rendered digest>"}` to the
//! user's webhook URL. Exactly one attempt is made per digest.

use std::time::Duration;

use async_trait::async_trait;
use radar_core::channels::ChannelKind;
use radar_core::digest::{render_chat, DigestLinks};

use super::{DeliveryChannel, DeliveryError};
use crate::aggregator::Digest;

/// Default HTTP timeout for a single webhook call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of a webhook URL may appear in logs. The tail carries the token.
const LOGGED_URL_CHARS: usize = 40;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for chat webhook failures.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook answered with a non-2xx status code.
    #[error("Chat webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// ChatWebhookChannel
// ---------------------------------------------------------------------------

pub struct ChatWebhookChannel {
    client: reqwest::Client,
    links: DigestLinks,
}

impl ChatWebhookChannel {
    /// Create a channel with its own HTTP client.
    pub fn new(links: DigestLinks, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, links))
    }

    /// Create a channel reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, links: DigestLinks) -> Self {
        Self { client, links }
    }

    async fn post(&self, url: &str, content: String) -> Result<(), ChatError> {
        let payload = serde_json::json!({ "content": content });
        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ChatError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for ChatWebhookChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Chat
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let content = render_chat(&digest.rows, &self.links);
        if let Err(e) = self.post(&digest.recipient, content).await {
            tracing::warn!(
                user_id = digest.user_id,
                webhook = %redacted(&digest.recipient),
                error = %e,
                "Chat webhook delivery failed"
            );
            return Err(e.into());
        }
        Ok(())
    }
}

/// Leading part of a webhook URL, safe to log.
fn redacted(url: &str) -> String {
    if url.chars().count() <= LOGGED_URL_CHARS {
        return url.to_string();
    }
    let prefix: String = url.chars().take(LOGGED_URL_CHARS).collect();
    format!("{prefix}...")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use radar_core::availability::AvailabilityEvent;
    use radar_core::digest::DigestRow;

    use super::*;
    use crate::testing::one_shot_server;

    fn digest(recipient: &str) -> Digest {
        Digest {
            user_id: 7,
            channel: ChannelKind::Chat,
            recipient: recipient.to_string(),
            rows: vec![DigestRow {
                alert_name: "arm".to_string(),
                resource_type_name: "cax11".to_string(),
                location_name: "nbg1".to_string(),
                state: AvailabilityEvent::Unavailable,
            }],
        }
    }

    fn channel() -> ChatWebhookChannel {
        ChatWebhookChannel::new(DigestLinks::from_base_url("https://radar.test"), DEFAULT_TIMEOUT)
            .unwrap()
    }

    #[test]
    fn chat_error_display_http_status() {
        let err = ChatError::HttpStatus(429);
        assert_eq!(err.to_string(), "Chat webhook returned HTTP 429");
    }

    #[test]
    fn redacted_truncates_long_urls() {
        let url = "https://discord.com/api/webhooks/123456789/secret-token-value";
        let logged = redacted(url);
        assert!(logged.ends_with("..."));
        assert!(!logged.contains("secret-token-value"));
        assert_eq!(redacted("https://short"), "https://short");
    }

    #[tokio::test]
    async fn posts_rendered_content() {
        let (url, server) = one_shot_server(204).await;

        channel().deliver(&digest(&url)).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.head.starts_with("post /hook"));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        let content = body["content"].as_str().unwrap();
        assert!(content.contains("❌"));
        assert!(content.contains("cax11"));
        assert!(content.contains("https://radar.test/cloud-status"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (url, server) = one_shot_server(500).await;

        let result = channel().deliver(&digest(&url)).await;

        assert_matches!(result, Err(DeliveryError::Chat(ChatError::HttpStatus(500))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_url_is_a_request_error() {
        let result = channel().deliver(&digest("not a url")).await;
        assert_matches!(result, Err(DeliveryError::Chat(ChatError::Request(_))));
    }
}
