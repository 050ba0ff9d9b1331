//! Background jobs.

pub mod evict_entities;
pub mod scheduler;

pub use evict_entities::EvictEntitiesJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
