/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Identifier assigned by the upstream provider to a server type or location.
pub type ExternalId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
