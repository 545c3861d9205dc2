//! Availability detector.
//!
//! Polls the cloud provider's catalog on a fixed interval, diffs each
//! snapshot against the previous one and publishes the resulting
//! availability changes: as analytics data points and as one batch relayed
//! to the alert pipeline's ingestion endpoint.

pub mod config;
pub mod monitor;
pub mod relay;
pub mod snapshot;
pub mod source;
pub mod telemetry;

#[cfg(test)]
mod testing;
