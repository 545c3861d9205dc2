//! Alert matching and notification dispatch pipeline.
//!
//! A batch of availability changes flows through these stages:
//!
//! - [`store`] - read active alert rules ([`AlertStore`]) once per batch.
//! - [`radar_core::matching`] - pure change x rule matching.
//! - [`TriggerRecorder`] - append one audit row per match, before any
//!   notification goes out.
//! - [`NotificationAggregator`] - fan-in per user, one [`Digest`] per
//!   channel.
//! - [`ChannelDispatcher`] - concurrent fan-out over the [`delivery`]
//!   channels, each failing independently.
//!
//! [`BatchProcessor`] wires the stages together.

pub mod aggregator;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod processor;
pub mod recorder;
pub mod store;

#[cfg(test)]
mod testing;

pub use aggregator::{Digest, NotificationAggregator};
pub use delivery::chat::ChatWebhookChannel;
pub use delivery::email::{EmailChannel, EmailConfig, MailQueue, MailWorker, SmtpMailer};
pub use dispatcher::{ChannelDispatcher, DispatchReport};
pub use error::PipelineError;
pub use processor::{BatchProcessor, BatchSummary, IngestBatch};
pub use recorder::TriggerRecorder;
pub use store::{AlertStore, PgStore, TriggerStore, UserDirectory};
