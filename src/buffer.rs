use crate::record::Record;

/// Ordered, bounded accumulator for received records.
///
/// `append` only reports that the threshold is met; the ingestion loop
/// decides when to act on it. Keeping the flush decision out of this type
/// leaves it free of I/O and trivially testable.
#[derive(Debug)]
pub struct BatchBuffer {
    records: Vec<Record>,
    threshold: usize,
}

impl BatchBuffer {
    /// Creates an empty buffer. `threshold` is clamped to at least 1.
    pub fn new(threshold: usize) -> BatchBuffer {
        BatchBuffer {
            records: Vec::new(),
            threshold: threshold.max(1),
        }
    }

    /// Appends to the tail and returns whether the threshold is now met or
    /// exceeded.
    pub fn append(&mut self, record: Record) -> bool {
        self.records.push(record);
        self.records.len() >= self.threshold
    }

    /// Returns the buffered records in arrival order and resets to empty.
    ///
    /// Safe to call on an empty buffer; the result is just an empty vec.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(payload: &str) -> Record {
        Record::capture(payload.to_string())
    }

    #[test]
    fn drains_in_arrival_order() {
        let mut buffer = BatchBuffer::new(10);
        for payload in ["first", "second", "third"] {
            buffer.append(record(payload));
        }

        let drained = buffer.drain();
        let payloads: Vec<&str> = drained.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, ["first", "second", "third"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_on_empty_buffer_returns_empty() {
        let mut buffer = BatchBuffer::new(3);
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn append_signals_exactly_at_threshold() {
        let mut buffer = BatchBuffer::new(3);
        assert!(!buffer.append(record("a")));
        assert!(!buffer.append(record("b")));
        assert!(buffer.append(record("c")));

        // The buffer never flushes by itself; a fourth append still signals.
        assert!(buffer.append(record("d")));
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn threshold_is_at_least_one() {
        let mut buffer = BatchBuffer::new(0);
        assert!(buffer.append(record("a")));
    }
}
