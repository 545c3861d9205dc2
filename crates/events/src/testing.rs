//! In-memory fakes for the pipeline seams.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use radar_core::alert::{AlertRule, NotificationEnvelope, TriggerOn};
use radar_core::availability::{AvailabilityChange, AvailabilityEvent};
use radar_core::channels::ChannelKind;
use radar_core::types::{DbId, ExternalId};
use radar_db::models::user::UserProfile;

use crate::aggregator::Digest;
use crate::delivery::chat::ChatError;
use crate::delivery::email::EmailError;
use crate::delivery::{DeliveryChannel, DeliveryError};
use crate::store::{AlertStore, TriggerStore, UserDirectory};

/// Owner of every envelope built by [`envelope`].
pub const DEFAULT_OWNER: DbId = 100;

pub fn change(
    resource_type_id: ExternalId,
    location_id: ExternalId,
    event_type: AvailabilityEvent,
) -> AvailabilityChange {
    AvailabilityChange {
        resource_type_id,
        resource_type_name: format!("type-{resource_type_id}"),
        location_id,
        location_name: format!("loc-{location_id}"),
        event_type,
        timestamp: 1_700_000_000_000,
    }
}

/// Email-only envelope owned by [`DEFAULT_OWNER`].
pub fn envelope(
    alert_id: DbId,
    resource_type_id: ExternalId,
    location_id: ExternalId,
    event_type: AvailabilityEvent,
) -> NotificationEnvelope {
    NotificationEnvelope {
        owner_user_id: DEFAULT_OWNER,
        alert_id,
        alert_name: format!("alert {alert_id}"),
        change: change(resource_type_id, location_id, event_type),
        email_enabled: true,
        chat_enabled: false,
    }
}

pub fn rule(
    id: DbId,
    owner_user_id: DbId,
    resource_type_ids: &[ExternalId],
    location_ids: &[ExternalId],
    trigger_on: TriggerOn,
) -> AlertRule {
    AlertRule {
        id,
        owner_user_id,
        name: format!("alert {id}"),
        resource_type_ids: resource_type_ids.iter().copied().collect::<BTreeSet<_>>(),
        location_ids: location_ids.iter().copied().collect::<BTreeSet<_>>(),
        trigger_on,
        email_enabled: true,
        chat_enabled: false,
        created_at: chrono::Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAlertStore {
    rules: Vec<AlertRule>,
    failing: bool,
    calls: Mutex<usize>,
}

impl FakeAlertStore {
    pub fn with_rules(rules: Vec<AlertRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl AlertStore for FakeAlertStore {
    async fn list_active(&self) -> Result<Vec<AlertRule>, sqlx::Error> {
        *self.calls.lock().unwrap() += 1;
        if self.failing {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.rules.clone())
    }
}

type TriggerKey = (String, DbId, ExternalId, ExternalId, AvailabilityEvent);

/// Trigger store that keeps rows in memory and enforces batch dedup.
#[derive(Default)]
pub struct RecordingTriggerStore {
    rows: Mutex<Vec<NotificationEnvelope>>,
    seen: Mutex<HashSet<TriggerKey>>,
    fail_after: Option<usize>,
}

impl RecordingTriggerStore {
    /// Accept `n` rows, then fail every insert.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn recorded_alert_ids(&self) -> Vec<DbId> {
        self.rows.lock().unwrap().iter().map(|e| e.alert_id).collect()
    }
}

#[async_trait]
impl TriggerStore for RecordingTriggerStore {
    async fn record(
        &self,
        batch_id: Option<&str>,
        envelope: &NotificationEnvelope,
    ) -> Result<bool, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        if self.fail_after.is_some_and(|n| rows.len() >= n) {
            return Err(sqlx::Error::PoolClosed);
        }
        if let Some(batch_id) = batch_id {
            let key = (
                batch_id.to_string(),
                envelope.alert_id,
                envelope.change.resource_type_id,
                envelope.change.location_id,
                envelope.change.event_type,
            );
            if !self.seen.lock().unwrap().insert(key) {
                return Ok(false);
            }
        }
        rows.push(envelope.clone());
        Ok(true)
    }
}

#[derive(Default)]
pub struct FakeUsers {
    users: HashMap<DbId, UserProfile>,
    lookups: Mutex<HashMap<DbId, usize>>,
    failing: bool,
}

impl FakeUsers {
    pub fn with_user(mut self, id: DbId, email: &str, webhook: Option<&str>) -> Self {
        self.users.insert(
            id,
            UserProfile {
                id,
                email: email.to_string(),
                chat_webhook_url: webhook.map(str::to_string),
                created_at: chrono::Utc::now(),
            },
        );
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn lookups(&self, user_id: DbId) -> usize {
        self.lookups.lock().unwrap().get(&user_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn find_user(&self, user_id: DbId) -> Result<Option<UserProfile>, sqlx::Error> {
        *self.lookups.lock().unwrap().entry(user_id).or_default() += 1;
        if self.failing {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.users.get(&user_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Channel that records every digest it is asked to deliver.
pub struct RecordingChannel {
    kind: ChannelKind,
    delivered: Mutex<Vec<Digest>>,
    failing_users: HashSet<DbId>,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            delivered: Mutex::new(Vec::new()),
            failing_users: HashSet::new(),
        }
    }

    /// Fail every delivery addressed to `user_id`.
    pub fn failing_for(mut self, user_id: DbId) -> Self {
        self.failing_users.insert(user_id);
        self
    }

    pub fn delivered(&self) -> Vec<Digest> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(digest.clone());
        if self.failing_users.contains(&digest.user_id) {
            return Err(match self.kind {
                ChannelKind::Email => EmailError::QueueFull.into(),
                ChannelKind::Chat => ChatError::HttpStatus(502).into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// What a [`one_shot_server`] received. `head` is lowercased.
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Accept one HTTP connection, capture the request and answer with `status`.
pub async fn one_shot_server(status: u16) -> (String, tokio::task::JoinHandle<CapturedRequest>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let captured = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = text[..split].to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let body = &text[split + 4..];
                if body.len() >= length || n == 0 {
                    break CapturedRequest {
                        head,
                        body: body.to_string(),
                    };
                }
            } else if n == 0 {
                break CapturedRequest {
                    head: text.to_ascii_lowercase(),
                    body: String::new(),
                };
            }
        };
        let response =
            format!("HTTP/1.1 {status} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(response.as_bytes()).await.unwrap();
        captured
    });

    (url, handle)
}
