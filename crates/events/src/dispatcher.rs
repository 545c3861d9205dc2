//! Concurrent fan-out of digests to their delivery channels.

use std::sync::Arc;

use futures::future::join_all;
use radar_core::channels::ChannelKind;
use radar_core::types::DbId;

use crate::aggregator::Digest;
use crate::delivery::DeliveryChannel;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed(String),
    /// No attempt was made, e.g. the channel is not configured.
    Skipped(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub user_id: DbId,
    pub channel: ChannelKind,
    pub status: DeliveryStatus,
}

/// Per-digest outcomes of one dispatch round, in digest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Sent))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Skipped(_)))
    }

    fn count(&self, predicate: impl Fn(&DeliveryStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Routes each digest to the channel of its kind.
///
/// All attempts of a round run concurrently and settle independently: a
/// failed or slow channel never prevents another digest from being
/// attempted, and nothing is retried.
#[derive(Default, Clone)]
pub struct ChannelDispatcher {
    email: Option<Arc<dyn DeliveryChannel>>,
    chat: Option<Arc<dyn DeliveryChannel>>,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `channel` for the digests of its kind, replacing any
    /// previous one.
    pub fn with_channel(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        match channel.kind() {
            ChannelKind::Email => self.email = Some(channel),
            ChannelKind::Chat => self.chat = Some(channel),
        }
        self
    }

    fn channel_for(&self, kind: ChannelKind) -> Option<&Arc<dyn DeliveryChannel>> {
        match kind {
            ChannelKind::Email => self.email.as_ref(),
            ChannelKind::Chat => self.chat.as_ref(),
        }
    }

    pub async fn dispatch(&self, digests: Vec<Digest>) -> DispatchReport {
        let attempts = digests.iter().map(|digest| self.attempt(digest));
        let outcomes = join_all(attempts).await;

        let report = DispatchReport { outcomes };
        tracing::info!(
            sent = report.sent(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Dispatch round settled"
        );
        report
    }

    async fn attempt(&self, digest: &Digest) -> DeliveryOutcome {
        let status = match self.channel_for(digest.channel) {
            None => {
                tracing::debug!(
                    user_id = digest.user_id,
                    channel = %digest.channel,
                    "Channel not configured, skipping digest"
                );
                DeliveryStatus::Skipped("channel not configured")
            }
            Some(channel) => match channel.deliver(digest).await {
                Ok(()) => DeliveryStatus::Sent,
                Err(e) => {
                    tracing::error!(
                        user_id = digest.user_id,
                        channel = %digest.channel,
                        error = %e,
                        "Digest delivery failed"
                    );
                    DeliveryStatus::Failed(e.to_string())
                }
            },
        };

        DeliveryOutcome {
            user_id: digest.user_id,
            channel: digest.channel,
            status,
        }
    }
}
