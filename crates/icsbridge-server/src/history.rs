//! In-memory record of recent sync cycles.
//!
//! The history is bounded: once full, the oldest record is dropped. It is
//! never written to disk.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use icsbridge_sync::SyncResult;
use serde::{Deserialize, Serialize};

/// Default number of cycles kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// When the cycle finished.
    pub timestamp: DateTime<Utc>,
    /// Whether the cycle completed.
    pub success: bool,
    /// Counts reported by the cycle; zero when it failed.
    #[serde(flatten)]
    pub counts: SyncResult,
    /// Error message of a failed cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncRecord {
    /// Records a completed cycle.
    pub fn success(timestamp: DateTime<Utc>, counts: SyncResult) -> Self {
        Self {
            timestamp,
            success: true,
            counts,
            error: None,
        }
    }

    /// Records a failed cycle.
    pub fn failure(timestamp: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            timestamp,
            success: false,
            counts: SyncResult::default(),
            error: Some(error.into()),
        }
    }
}

/// Bounded list of [`SyncRecord`]s, oldest first.
#[derive(Debug, Clone)]
pub struct SyncHistory {
    records: VecDeque<SyncRecord>,
    capacity: usize,
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SyncHistory {
    /// Creates an empty history keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Appends a record, evicting the oldest one when full.
    pub fn push(&mut self, record: SyncRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Returns the most recent record.
    pub fn last(&self) -> Option<&SyncRecord> {
        self.records.back()
    }

    /// Iterates over the records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SyncRecord> {
        self.records.iter()
    }

    /// Number of records kept.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no cycle has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders the records as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn evicts_oldest() {
        let mut history = SyncHistory::new(2);
        history.push(SyncRecord::failure(at(0), "first"));
        history.push(SyncRecord::success(at(1), SyncResult::default()));
        history.push(SyncRecord::success(at(2), SyncResult::default()));

        assert_eq!(history.len(), 2);
        let stamps: Vec<_> = history.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![at(1), at(2)]);
        assert_eq!(history.last().map(|r| r.timestamp), Some(at(2)));
    }

    #[test]
    fn default_capacity() {
        let mut history = SyncHistory::default();
        for minute in 0..59 {
            history.push(SyncRecord::success(at(minute), SyncResult::default()));
            history.push(SyncRecord::success(at(minute), SyncResult::default()));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn json_shape() {
        let mut history = SyncHistory::default();
        history.push(SyncRecord::success(
            at(0),
            SyncResult {
                wanted: 2,
                created: 1,
                unchanged: 1,
                ..SyncResult::default()
            },
        ));
        history.push(SyncRecord::failure(at(15), "feed fetch failed: HTTP 503"));

        let value: serde_json::Value = serde_json::from_str(&history.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["success"], true);
        assert_eq!(value[0]["created"], 1);
        assert!(value[0].get("error").is_none());
        assert_eq!(value[1]["success"], false);
        assert_eq!(value[1]["error"], "feed fetch failed: HTTP 503");
        assert_eq!(value[1]["timestamp"], "2024-03-01T12:15:00Z");
    }
}
