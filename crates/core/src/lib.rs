//! Domain types and pure logic for Server Radar.
//!
//! Nothing in this crate performs I/O. The pipeline crates build on these
//! types to match availability changes against alert rules and render the
//! resulting digests.

pub mod alert;
pub mod availability;
pub mod channels;
pub mod digest;
pub mod error;
pub mod fingerprint;
pub mod matching;
pub mod types;
