//! Record batches produced by one fetch.
//!
//! Records are opaque JSON objects: the scheduler and the rotation policy only
//! count and forward them, the storage formats only serialize them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single market-data record (one JSON object per instrument).
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Ordered sequence of records produced by one fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    /// Records in source order.
    pub records: Vec<Record>,
    /// When the batch was fetched (UTC).
    pub fetched_at: DateTime<Utc>,
}

impl RecordBatch {
    /// Create a batch stamped with the current time.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    /// Create an empty batch.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordBatch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
