//! Repository for the `sign_in_codes` table.

use radar_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::sign_in_code::SignInCode;

/// Column list for `sign_in_codes` queries.
const COLUMNS: &str = "id, user_id, code_hash, expires_at, created_at";

pub struct SignInCodeRepo;

impl SignInCodeRepo {
    /// Store a hashed sign-in code, returning its id.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO sign_in_codes (user_id, code_hash, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(code_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Codes issued to a user that have not expired yet, newest first.
    pub async fn list_unexpired_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<SignInCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sign_in_codes \
             WHERE user_id = $1 AND expires_at > NOW() \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SignInCode>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Drop expired codes for a user, returning how many were removed.
    pub async fn delete_expired_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sign_in_codes WHERE user_id = $1 AND expires_at < NOW()")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drop every code for a user, returning how many were removed.
    pub async fn delete_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sign_in_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
