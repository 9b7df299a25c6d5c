use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use chrono::Utc;
use log::debug;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use parquet::arrow::ArrowWriter;
use url::Url;

use super::{Sink, SinkError};
use crate::record::Record;

/// Columnar file sink: one immutable parquet file per batch, named by the
/// write timestamp.
///
/// The destination is either a local directory or a remote object store.
/// Remote batches are encoded in memory and uploaded with a single `put`, so
/// no temporary files touch disk.
pub struct ParquetSink {
    schema: Arc<Schema>,
    destination: Destination,
}

enum Destination {
    Directory(PathBuf),
    Remote {
        store: Arc<dyn ObjectStore>,
        prefix: StorePath,
    },
}

impl ParquetSink {
    /// `destination` is a local directory (created if missing) or an
    /// object-store URL such as `s3://bucket/prefix` or `gs://bucket/prefix`.
    pub fn open(destination: &str) -> Result<ParquetSink, SinkError> {
        let destination = if destination.contains("://") {
            let url = Url::parse(destination).map_err(|err| {
                SinkError::InvalidDestination(destination.to_string(), err.to_string())
            })?;
            let (store, prefix) = object_store::parse_url(&url)?;
            Destination::Remote {
                store: Arc::from(store),
                prefix,
            }
        } else {
            let dir = PathBuf::from(destination);
            std::fs::create_dir_all(&dir)?;
            Destination::Directory(dir)
        };
        Ok(ParquetSink {
            schema: batch_schema(),
            destination,
        })
    }

    #[cfg(test)]
    fn with_store(store: Arc<dyn ObjectStore>, prefix: StorePath) -> ParquetSink {
        ParquetSink {
            schema: batch_schema(),
            destination: Destination::Remote { store, prefix },
        }
    }

    fn to_record_batch(&self, batch: &[Record]) -> Result<RecordBatch, SinkError> {
        let timestamps: StringArray = batch
            .iter()
            .map(|record| Some(record.received_timestamp()))
            .collect();
        let payloads: StringArray = batch
            .iter()
            .map(|record| Some(record.payload.as_str()))
            .collect();
        let columns = vec![
            Arc::new(timestamps) as ArrayRef,
            Arc::new(payloads) as ArrayRef,
        ];
        Ok(RecordBatch::try_new(Arc::clone(&self.schema), columns)?)
    }
}

impl Sink for ParquetSink {
    async fn write_batch(&mut self, batch: Vec<Record>) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let record_batch = self.to_record_batch(&batch)?;
        let name = batch_file_name();
        match &self.destination {
            Destination::Directory(dir) => {
                let path = dir.join(&name);
                let file = File::create(&path)?;
                let mut writer = ArrowWriter::try_new(file, Arc::clone(&self.schema), None)?;
                writer.write(&record_batch)?;
                writer.close()?;
                debug!("wrote {}", path.display());
            }
            Destination::Remote { store, prefix } => {
                let mut encoded = Vec::new();
                let mut writer =
                    ArrowWriter::try_new(&mut encoded, Arc::clone(&self.schema), None)?;
                writer.write(&record_batch)?;
                writer.close()?;
                let location = prefix.child(name.as_str());
                store
                    .put(&location, PutPayload::from(Bytes::from(encoded)))
                    .await?;
                debug!("uploaded {location}");
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // Every batch is a self-contained file; nothing is held open.
        Ok(())
    }
}

fn batch_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("receivedTimestamp", DataType::Utf8, false),
        Field::new("payload", DataType::Utf8, false),
    ]))
}

fn batch_file_name() -> String {
    format!(
        "jetstream_{}.parquet",
        Utc::now().format("%Y%m%d_%H%M%S%3f")
    )
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;
    use object_store::memory::InMemory;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    use super::*;

    fn record(payload: &str) -> Record {
        Record::capture(payload.to_string())
    }

    #[tokio::test]
    async fn writes_one_file_per_batch() {
        let dir = tempdir().unwrap();
        let mut sink = ParquetSink::open(dir.path().to_str().unwrap()).unwrap();
        sink.write_batch(vec![record("a"), record("b")])
            .await
            .unwrap();
        sink.close().await.unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().into_string().unwrap();
        assert!(name.starts_with("jetstream_") && name.ends_with(".parquet"));

        let file = File::open(files[0].path()).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 2);

        let payloads = batches[0]
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(payloads.value(0), "a");
        assert_eq!(payloads.value(1), "b");
    }

    #[tokio::test]
    async fn empty_batch_creates_no_file() {
        let dir = tempdir().unwrap();
        let mut sink = ParquetSink::open(dir.path().to_str().unwrap()).unwrap();
        sink.write_batch(Vec::new()).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn uploads_batch_to_object_store() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let mut sink =
            ParquetSink::with_store(Arc::clone(&store), StorePath::from("batches"));
        sink.write_batch(vec![record("remote")]).await.unwrap();
        sink.close().await.unwrap();

        let objects: Vec<_> = store
            .list(Some(&StorePath::from("batches")))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].location.to_string().ends_with(".parquet"));
    }
}
