//! Storage seams used by the pipeline.
//!
//! The pipeline only sees these traits; [`PgStore`] backs all three with
//! the Postgres repositories, and tests substitute in-memory fakes.

use async_trait::async_trait;
use radar_core::alert::{AlertRule, NotificationEnvelope};
use radar_core::types::DbId;
use radar_db::models::trigger::NewAlertTrigger;
use radar_db::models::user::UserProfile;
use radar_db::repositories::{AlertRepo, TriggerRepo, UserRepo};
use radar_db::DbPool;

/// Read access to the active alert rules.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// All rules that should be evaluated, oldest first.
    async fn list_active(&self) -> Result<Vec<AlertRule>, sqlx::Error>;
}

/// Append-only trigger audit trail.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    /// Persist one match.
    ///
    /// Returns `false` if the match was already recorded under the same
    /// `batch_id`. Without a batch id every call records a new row.
    async fn record(
        &self,
        batch_id: Option<&str>,
        envelope: &NotificationEnvelope,
    ) -> Result<bool, sqlx::Error>;
}

/// Read access to user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: DbId) -> Result<Option<UserProfile>, sqlx::Error>;
}

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn list_active(&self) -> Result<Vec<AlertRule>, sqlx::Error> {
        AlertRepo::list_active(&self.pool).await
    }
}

#[async_trait]
impl TriggerStore for PgStore {
    async fn record(
        &self,
        batch_id: Option<&str>,
        envelope: &NotificationEnvelope,
    ) -> Result<bool, sqlx::Error> {
        let trigger = NewAlertTrigger::from_envelope(batch_id, envelope);
        Ok(TriggerRepo::insert(&self.pool, &trigger).await?.is_some())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user(&self, user_id: DbId) -> Result<Option<UserProfile>, sqlx::Error> {
        UserRepo::find_by_id(&self.pool, user_id).await
    }
}
