//! Per-user fan-in of matched envelopes.

use std::collections::BTreeMap;
use std::sync::Arc;

use radar_core::alert::NotificationEnvelope;
use radar_core::channels::ChannelKind;
use radar_core::digest::DigestRow;
use radar_core::types::DbId;

use crate::store::UserDirectory;

/// One message to one user over one channel, summarizing a whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub user_id: DbId,
    pub channel: ChannelKind,
    /// Email address or chat webhook URL, depending on `channel`.
    pub recipient: String,
    pub rows: Vec<DigestRow>,
}

/// Groups envelopes by owner and builds at most one digest per channel for
/// each of them.
pub struct NotificationAggregator {
    users: Arc<dyn UserDirectory>,
}

impl NotificationAggregator {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Build the digests for a batch.
    ///
    /// Each distinct owner's profile is looked up exactly once. An envelope
    /// contributes to the email digest when its rule has email enabled and to
    /// the chat digest when its rule has chat enabled and the user has a
    /// webhook configured. Owners without a profile are skipped.
    pub async fn aggregate(
        &self,
        envelopes: &[NotificationEnvelope],
    ) -> Result<Vec<Digest>, sqlx::Error> {
        let mut by_user: BTreeMap<DbId, Vec<&NotificationEnvelope>> = BTreeMap::new();
        for envelope in envelopes {
            by_user.entry(envelope.owner_user_id).or_default().push(envelope);
        }

        tracing::debug!(
            matches = envelopes.len(),
            users = by_user.len(),
            "Grouped matches by user"
        );

        let mut digests = Vec::new();

        for (user_id, user_envelopes) in by_user {
            let Some(user) = self.users.find_user(user_id).await? else {
                tracing::warn!(user_id, "Alert owner not found, skipping notifications");
                continue;
            };

            let email_rows = rows_where(&user_envelopes, |e| e.email_enabled);
            if !email_rows.is_empty() {
                match user.email_address() {
                    Some(address) => digests.push(Digest {
                        user_id,
                        channel: ChannelKind::Email,
                        recipient: address.to_string(),
                        rows: email_rows,
                    }),
                    None => tracing::debug!(user_id, "No email address, skipping email digest"),
                }
            }

            let chat_rows = rows_where(&user_envelopes, |e| e.chat_enabled);
            if !chat_rows.is_empty() {
                match user.chat_webhook() {
                    Some(webhook) => digests.push(Digest {
                        user_id,
                        channel: ChannelKind::Chat,
                        recipient: webhook.to_string(),
                        rows: chat_rows,
                    }),
                    None => tracing::debug!(user_id, "No chat webhook, skipping chat digest"),
                }
            }
        }

        Ok(digests)
    }
}

fn rows_where(
    envelopes: &[&NotificationEnvelope],
    predicate: impl Fn(&NotificationEnvelope) -> bool,
) -> Vec<DigestRow> {
    let mut rows: Vec<DigestRow> = envelopes
        .iter()
        .copied()
        .filter(|e| predicate(*e))
        .map(DigestRow::from)
        .collect();
    rows.sort();
    rows
}
