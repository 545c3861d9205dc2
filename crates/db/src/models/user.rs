//! User profile rows, as far as notification delivery needs them.

use radar_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub email: String,
    pub chat_webhook_url: Option<String>,
    pub created_at: Timestamp,
}

impl UserProfile {
    /// The chat webhook, if one is configured and non-blank.
    pub fn chat_webhook(&self) -> Option<&str> {
        self.chat_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// The email address, if non-blank.
    pub fn email_address(&self) -> Option<&str> {
        Some(self.email.trim()).filter(|email| !email.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str, webhook: Option<&str>) -> UserProfile {
        UserProfile {
            id: 1,
            email: email.to_string(),
            chat_webhook_url: webhook.map(str::to_string),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn blank_webhook_counts_as_missing() {
        assert_eq!(profile("a@b.c", Some("  ")).chat_webhook(), None);
        assert_eq!(profile("a@b.c", None).chat_webhook(), None);
        assert_eq!(
            profile("a@b.c", Some("https://discord.test/hook")).chat_webhook(),
            Some("https://discord.test/hook")
        );
    }

    #[test]
    fn blank_email_counts_as_missing() {
        assert_eq!(profile("", None).email_address(), None);
        assert_eq!(profile("a@b.c", None).email_address(), Some("a@b.c"));
    }
}
