//! The `Record` type appended by the collector (§4B) and read back by the
//! ingestor.
//!
//! A record is an opaque, semi-structured blob addressed by the class it
//! was filed under and its position within that class's append-only file
//! (§3: "one JSON/msgpack blob per enumerated object, addressed by
//! `(class_name, auto_incrementing_id)`").

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted record: the raw JSON body returned by Azure, tagged with
/// the class it was filed under.
///
/// `sequence` is `None` before the record has been appended (the Record
/// Store assigns it on write, mirroring the `AUTOINCREMENT` row id) and
/// `Some` once read back during ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub class: String,
    pub sequence: Option<i64>,
    pub payload: Value,
}

impl Record {
    /// Creates a new, not-yet-persisted record.
    #[must_use]
    pub fn new(class: impl Into<String>, payload: Value) -> Self {
        Self {
            class: class.into(),
            sequence: None,
            payload,
        }
    }

    /// Attaches the sequence number assigned by the Record Store on write.
    #[must_use]
    pub fn with_sequence(mut self, sequence: i64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_has_no_sequence() {
        let record = Record::new("tenant", json!({"id": "t1"}));
        assert!(record.sequence.is_none());
        assert_eq!(record.class, "tenant");
    }

    #[test]
    fn with_sequence_attaches_position() {
        let record = Record::new("tenant", json!({"id": "t1"})).with_sequence(7);
        assert_eq!(record.sequence, Some(7));
    }
}
