//! External delivery channels for digests.
//!
//! Each channel is its own failure domain: an error from one never affects
//! another, and nothing is retried.

pub mod chat;
pub mod email;

use async_trait::async_trait;
use radar_core::channels::ChannelKind;

use crate::aggregator::Digest;

/// Error type for a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] email::EmailError),

    #[error(transparent)]
    Chat(#[from] chat::ChatError),
}

/// A delivery path digests can be sent through.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Which digests this channel handles.
    fn kind(&self) -> ChannelKind;

    /// Make one delivery attempt for `digest`.
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError>;
}
