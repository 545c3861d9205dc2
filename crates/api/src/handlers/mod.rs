pub mod ingest;
pub mod sign_in;
