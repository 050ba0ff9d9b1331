//! Idle entity eviction background job.

use std::sync::Arc;
use tracing::info;

use domain::services::LocationMonitor;
use persistence::activity_log::InMemoryActivityLog;

use super::scheduler::{Job, JobFrequency};

/// Background job that drops entities that have stopped reporting and
/// clears their retained activity records.
pub struct EvictEntitiesJob {
    monitor: Arc<LocationMonitor>,
    activity_log: Arc<InMemoryActivityLog>,
    max_idle_hours: i64,
    interval_minutes: u64,
}

impl EvictEntitiesJob {
    pub fn new(
        monitor: Arc<LocationMonitor>,
        activity_log: Arc<InMemoryActivityLog>,
        max_idle_hours: i64,
        interval_minutes: u64,
    ) -> Self {
        Self {
            monitor,
            activity_log,
            max_idle_hours,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for EvictEntitiesJob {
    fn name(&self) -> &'static str {
        "evict_entities"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let evicted = self
            .monitor
            .evict_idle(chrono::Duration::hours(self.max_idle_hours));

        if evicted.is_empty() {
            return Ok(());
        }

        let mut records_dropped = 0;
        for entity_id in &evicted {
            records_dropped += self.activity_log.clear_entity(entity_id);
        }

        info!(
            evicted = evicted.len(),
            records_dropped,
            max_idle_hours = self.max_idle_hours,
            "Evicted idle entities"
        );

        Ok(())
    }
}
