//! Rolling per-entity activity log.
//!
//! Keeps a bounded window of activity snapshots per entity and serves
//! them newest first with opaque cursor pagination. The log is the
//! default [`ActivityRecorder`] wired into the monitor.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use domain::models::ActivitySnapshot;
use domain::services::{ActivityRecorder, RecordResult};
use shared::pagination::{decode_cursor, encode_cursor, CursorError};

use crate::metrics::record_store_size;

/// Default number of activity entries retained per entity.
pub const DEFAULT_CAPACITY_PER_ENTITY: usize = 1000;

/// One retained activity entry with its position in the log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(flatten)]
    pub snapshot: ActivitySnapshot,
    pub recorded_at: DateTime<Utc>,
    #[serde(skip)]
    pub seq: u64,
}

/// One page of activity entries, newest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub entries: Vec<ActivityRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl ActivityPage {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

pub struct InMemoryActivityLog {
    entries: RwLock<HashMap<String, VecDeque<ActivityRecord>>>,
    next_seq: AtomicU64,
    capacity_per_entity: usize,
}

impl InMemoryActivityLog {
    pub fn new(capacity_per_entity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            capacity_per_entity: capacity_per_entity.max(1),
        }
    }

    /// Returns one page of an entity's activity, newest first. The cursor
    /// marks the last entry of the previous page; entries strictly older
    /// than it are returned.
    pub fn query(
        &self,
        entity_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<ActivityPage, CursorError> {
        let after = match cursor {
            Some(raw) => Some(decode_cursor(raw)?),
            None => None,
        };

        let entries = self.entries.read().unwrap();
        let Some(log) = entries.get(entity_id) else {
            return Ok(ActivityPage::empty());
        };

        let mut selected: Vec<ActivityRecord> = Vec::new();
        let mut has_more = false;
        for record in log.iter().rev() {
            if let Some((recorded_at, seq)) = after {
                if (record.recorded_at, record.seq) >= (recorded_at, seq) {
                    continue;
                }
            }
            if selected.len() == limit {
                has_more = true;
                break;
            }
            selected.push(record.clone());
        }

        let next_cursor = if has_more {
            selected
                .last()
                .map(|record| encode_cursor(record.recorded_at, record.seq))
        } else {
            None
        };

        Ok(ActivityPage {
            entries: selected,
            next_cursor,
            has_more,
        })
    }

    pub fn entry_count(&self, entity_id: &str) -> usize {
        self.entries
            .read()
            .unwrap()
            .get(entity_id)
            .map(|log| log.len())
            .unwrap_or(0)
    }

    pub fn total_entries(&self) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .map(|log| log.len())
            .sum()
    }

    /// Drops an entity's log, e.g. after the entity itself was evicted.
    /// Returns how many entries were discarded.
    pub fn clear_entity(&self, entity_id: &str) -> usize {
        let mut entries = self.entries.write().unwrap();
        let dropped = entries.remove(entity_id).map(|log| log.len()).unwrap_or(0);
        let total = entries.values().map(|log| log.len()).sum();
        record_store_size("activity_log", total);
        dropped
    }
}

impl Default for InMemoryActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_PER_ENTITY)
    }
}

#[async_trait::async_trait]
impl ActivityRecorder for InMemoryActivityLog {
    async fn record(&self, snapshot: ActivitySnapshot) -> RecordResult {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entity_id = snapshot.entity_id.clone();
        let record = ActivityRecord {
            snapshot,
            // Truncated to cursor precision so pagination comparisons are
            // exact round trips.
            recorded_at: Utc::now().trunc_subsecs(6),
            seq,
        };

        let mut entries = self.entries.write().unwrap();
        let log = entries.entry(entity_id).or_default();
        log.push_back(record);
        while log.len() > self.capacity_per_entity {
            log.pop_front();
        }
        let total = entries.values().map(|l| l.len()).sum();
        record_store_size("activity_log", total);
        RecordResult::Recorded
    }
}
