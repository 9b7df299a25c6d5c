use std::time::Duration;

use url::Url;

/// Plain-value configuration for the ingestion pipeline.
///
/// Argument parsing lives in the binary; the core only consumes the values
/// collected here.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Websocket endpoint of the subscription feed.
    pub endpoint: Url,
    /// Number of records to accumulate before a flush.
    pub batch_size: usize,
    /// Fixed delay before re-dialing after a transport failure.
    pub reconnect_delay: Duration,
}

impl IngestionConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "wss://jetstream2.us-east.bsky.network/subscribe";
    pub const DEFAULT_BATCH_SIZE: usize = 1000;
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

    pub fn new(endpoint: Url) -> IngestionConfig {
        IngestionConfig {
            endpoint,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
        }
    }
}
