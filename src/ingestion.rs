use log::{error, info};

use crate::buffer::BatchBuffer;
use crate::connector::MessageSource;
use crate::record::Record;
use crate::sink::{Sink, SinkError};

/// Ties the message source, batch buffer and sink together.
///
/// Flushes are synchronous with respect to intake: the loop does not pull
/// the next message until the current batch has been handed to the sink, so
/// at most one batch is ever in flight and memory stays bounded by the batch
/// size. A slow sink therefore stalls ingestion; that trade-off is
/// intentional.
pub struct Ingestor<C, S> {
    source: C,
    sink: S,
    buffer: BatchBuffer,
}

impl<C: MessageSource, S: Sink> Ingestor<C, S> {
    pub fn new(source: C, sink: S, batch_size: usize) -> Ingestor<C, S> {
        Ingestor {
            source,
            sink,
            buffer: BatchBuffer::new(batch_size),
        }
    }

    /// Runs until the source is exhausted or a sink write fails, then
    /// performs the final flush and closes the sink.
    ///
    /// The close step runs on every exit path, exactly once. A failed write
    /// ends the run; its batch is not re-queued.
    pub async fn run(mut self) -> Result<(), SinkError> {
        let intake = self.intake().await;
        let finish = self.finish().await;
        intake.and(finish)
    }

    async fn intake(&mut self) -> Result<(), SinkError> {
        while let Some(payload) = self.source.next_message().await {
            if self.buffer.append(Record::capture(payload)) {
                self.flush().await?;
            }
        }
        Ok(())
    }

    /// Flushes any remaining partial batch, then closes the sink.
    async fn finish(&mut self) -> Result<(), SinkError> {
        let flushed = self.flush().await;
        let closed = self.sink.close().await;
        flushed.and(closed)
    }

    /// Drains the buffer and hands the batch to the sink. An empty buffer is
    /// a no-op; the sink is not called.
    async fn flush(&mut self) -> Result<(), SinkError> {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();
        if let Err(err) = self.sink.write_batch(batch).await {
            error!("error writing batch: {err}");
            return Err(err);
        }
        info!("wrote batch of {count} messages");
        Ok(())
    }
}
