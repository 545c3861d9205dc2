pub mod ingest_auth;
pub mod rate_limit;
