//! Repository for the `users` table (read-only here).

use radar_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::UserProfile;

/// Column list for `users` queries.
const COLUMNS: &str = "id, email, chat_webhook_url, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email address (case-insensitive).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
