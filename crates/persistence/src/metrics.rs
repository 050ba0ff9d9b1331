//! Store metrics collection.
//!
//! Provides functions for recording store-related metrics.

use metrics::gauge;

/// Record the number of entries held by an in-memory store.
///
/// Call this function after mutating a store to track retention.
pub fn record_store_size(store: &'static str, size: usize) {
    gauge!("store_entries", "store" => store).set(size as f64);
}
