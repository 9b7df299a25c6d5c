//! Batched ingestion of a real-time websocket feed into durable storage.
//!
//! The pipeline subscribes to the Bluesky Jetstream firehose, timestamps
//! every message on receipt and accumulates them into bounded batches. Each
//! full batch is handed synchronously to a configured [`sink::Sink`] — an
//! embedded database or one parquet file per batch, optionally uploaded to
//! remote object storage. Transient network failures are absorbed by the
//! connector's reconnect policy; a termination signal drains the buffer
//! exactly once and closes the sink before the process exits.

pub mod buffer;
pub mod config;
pub mod connector;
mod error;
pub mod ingestion;
pub mod record;
pub mod shutdown;
pub mod sink;
pub mod timestamp;

pub use error::{Error, Result};
