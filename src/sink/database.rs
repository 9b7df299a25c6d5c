use std::path::Path;

use log::debug;
use rusqlite::{params, Connection};

use super::{Sink, SinkError};
use crate::record::Record;

/// Embedded database sink backed by SQLite.
///
/// Rows land in `jetstream_messages` in arrival order; each batch is one
/// transaction, so a failed write leaves no partial batch behind.
pub struct DatabaseSink {
    conn: Option<Connection>,
}

impl DatabaseSink {
    /// Opens (or creates) the database file and ensures the table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<DatabaseSink, SinkError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS jetstream_messages (
                receivedTimestamp TEXT NOT NULL,
                payload TEXT NOT NULL
            )",
        )?;
        Ok(DatabaseSink { conn: Some(conn) })
    }
}

impl Sink for DatabaseSink {
    async fn write_batch(&mut self, batch: Vec<Record>) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        let conn = self.conn.as_mut().ok_or(SinkError::Closed)?;
        let tx = conn.transaction()?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO jetstream_messages (receivedTimestamp, payload) VALUES (?1, ?2)",
            )?;
            for record in &batch {
                insert.execute(params![record.received_timestamp(), record.payload])?;
            }
        }
        tx.commit()?;
        debug!("committed {} rows", batch.len());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_conn, err)| SinkError::Database(err))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn record(payload: &str) -> Record {
        Record::capture(payload.to_string())
    }

    fn row_count(path: &Path) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM jetstream_messages", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn writes_rows_in_arrival_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut sink = DatabaseSink::open(&path).unwrap();
        sink.write_batch(vec![record("first"), record("second")])
            .await
            .unwrap();
        sink.write_batch(vec![record("third")]).await.unwrap();
        sink.close().await.unwrap();

        let conn = Connection::open(&path).unwrap();
        let payloads: Vec<String> = conn
            .prepare("SELECT payload FROM jetstream_messages ORDER BY rowid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(payloads, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn empty_batch_inserts_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut sink = DatabaseSink::open(&path).unwrap();
        sink.write_batch(Vec::new()).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(row_count(&path), 0);
    }

    #[tokio::test]
    async fn write_after_close_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut sink = DatabaseSink::open(&path).unwrap();
        sink.close().await.unwrap();

        let result = sink.write_batch(vec![record("late")]).await;
        assert!(matches!(result, Err(SinkError::Closed)));
    }
}
