//! Well-known delivery channel names.
//!
//! These appear in log fields and dispatch reports.

use serde::Serialize;

/// Digest delivered through the mail queue.
pub const CHANNEL_EMAIL: &str = "email";

/// Digest POSTed to the user's chat webhook.
pub const CHANNEL_CHAT: &str = "chat";

/// The delivery path a digest is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Chat,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Email => CHANNEL_EMAIL,
            ChannelKind::Chat => CHANNEL_CHAT,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
