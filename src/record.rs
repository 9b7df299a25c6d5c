use chrono::SecondsFormat;

use crate::timestamp::{self, Timestamp};

/// One ingested message together with its capture time.
///
/// The payload is opaque: it passes through the pipeline unparsed and
/// unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub received_at: Timestamp,
    pub payload: String,
}

impl Record {
    /// Captures `payload` with the current wall-clock time.
    pub fn capture(payload: String) -> Record {
        Record {
            received_at: timestamp::now(),
            payload,
        }
    }

    /// RFC 3339 rendering of the capture time, as persisted by sinks.
    pub fn received_timestamp(&self) -> String {
        self.received_at
            .to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}
