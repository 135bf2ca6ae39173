//! Response-duration statistics for the UDP frontend.
//!
//! One histogram, `response_duration_milliseconds`, labelled by action
//! name and error string (empty on success). The buckets double from
//! 9.375 ms up, ten of them. Exporter wiring is left to the embedding
//! application; this repository only collects.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, RwLockReadGuard};

/// The histogram name, kept with the data so exporters need no extra
/// configuration.
pub const RESPONSE_DURATION_HISTOGRAM: &str = "response_duration_milliseconds";

/// Upper bounds of the histogram buckets, in milliseconds.
pub const BUCKET_UPPER_BOUNDS_MS: [f64; 10] = [
    9.375, 18.75, 37.5, 75.0, 150.0, 300.0, 600.0, 1200.0, 2400.0, 4800.0,
];

/// One labelled histogram series.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Histogram {
    /// Cumulative observation counts per bucket, aligned with
    /// [`BUCKET_UPPER_BOUNDS_MS`]. Observations above the last bound
    /// only land in `count`.
    pub bucket_counts: [u64; 10],
    pub count: u64,
    pub sum_ms: f64,
}

impl Histogram {
    fn observe(&mut self, duration_ms: f64) {
        for (bucket, bound) in self.bucket_counts.iter_mut().zip(BUCKET_UPPER_BOUNDS_MS) {
            if duration_ms <= bound {
                *bucket += 1;
            }
        }

        self.count += 1;
        self.sum_ms += duration_ms;
    }
}

/// The collected metrics: one histogram series per (action, error)
/// label pair.
#[derive(Debug, Default)]
pub struct Metrics {
    pub response_durations: HashMap<(String, String), Histogram>,
}

impl Metrics {
    #[must_use]
    pub fn series(&self, action: &str, error: &str) -> Option<&Histogram> {
        self.response_durations.get(&(action.to_owned(), error.to_owned()))
    }
}

/// A repository for the frontend metrics.
#[derive(Clone, Default)]
pub struct Repository {
    pub stats: Arc<RwLock<Metrics>>,
}

impl Repository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_stats(&self) -> RwLockReadGuard<'_, Metrics> {
        self.stats.read().await
    }

    /// Records one handled packet: the action label, the error string
    /// (empty on success) and the time from dispatch entry to
    /// serialization complete.
    pub async fn record_response_duration(&self, action: &str, error: &str, duration: Duration) {
        let duration_ms = duration.as_secs_f64() * 1000.0;

        let mut stats_lock = self.stats.write().await;
        stats_lock
            .response_durations
            .entry((action.to_owned(), error.to_owned()))
            .or_default()
            .observe(duration_ms);
        drop(stats_lock);
    }
}
