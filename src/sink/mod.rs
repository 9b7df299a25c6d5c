mod database;
mod parquet;

pub use database::DatabaseSink;
pub use parquet::ParquetSink;

use crate::record::Record;

/// Destination for completed batches.
///
/// Implementations must persist records in the order given and treat an
/// empty batch as a successful no-op. `close` is called at most once, after
/// the last `write_batch`. Retry policy, if any, belongs to the
/// implementation; the ingestion loop treats a write error as fatal.
#[allow(async_fn_in_trait)]
pub trait Sink {
    async fn write_batch(&mut self, batch: Vec<Record>) -> Result<(), SinkError>;
    async fn close(&mut self) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to encode batch: {0}")]
    Encode(#[from] ::parquet::errors::ParquetError),
    #[error("failed to build batch columns: {0}")]
    Columns(#[from] arrow_schema::ArrowError),
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid destination {0:?}: {1}")]
    InvalidDestination(String, String),
    #[error("sink is already closed")]
    Closed,
}
