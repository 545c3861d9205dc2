//! One-time sign-in code rows.

use radar_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sign_in_codes` table. Only the hash of the code is stored.
#[derive(Debug, Clone, FromRow)]
pub struct SignInCode {
    pub id: DbId,
    pub user_id: DbId,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl SignInCode {
    /// Whether this row redeems a code with the given digest at `now`.
    pub fn redeems(&self, code_hash: &str, now: Timestamp) -> bool {
        self.code_hash == code_hash && now < self.expires_at
    }
}
