// src/pipeline/metrics.rs
//
// Run-level counters shared by every concurrent video task. Logged as JSON
// once the batch finishes.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub videos_processed: Arc<AtomicU64>,
    pub videos_failed: Arc<AtomicU64>,
    pub videos_empty: Arc<AtomicU64>,
    pub detections_ingested: Arc<AtomicU64>,
    pub tracks_seen: Arc<AtomicU64>,
    pub tracks_dropped: Arc<AtomicU64>,
    pub summaries_written: Arc<AtomicU64>,
    pub started_at: Instant,
    pub started_utc: DateTime<Utc>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            videos_processed: Arc::new(AtomicU64::new(0)),
            videos_failed: Arc::new(AtomicU64::new(0)),
            videos_empty: Arc::new(AtomicU64::new(0)),
            detections_ingested: Arc::new(AtomicU64::new(0)),
            tracks_seen: Arc::new(AtomicU64::new(0)),
            tracks_dropped: Arc::new(AtomicU64::new(0)),
            summaries_written: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
            started_utc: Utc::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            started_at: self.started_utc,
            videos_processed: self.videos_processed.load(Ordering::Relaxed),
            videos_failed: self.videos_failed.load(Ordering::Relaxed),
            videos_empty: self.videos_empty.load(Ordering::Relaxed),
            detections_ingested: self.detections_ingested.load(Ordering::Relaxed),
            tracks_seen: self.tracks_seen.load(Ordering::Relaxed),
            tracks_dropped: self.tracks_dropped.load(Ordering::Relaxed),
            summaries_written: self.summaries_written.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub started_at: DateTime<Utc>,
    pub videos_processed: u64,
    pub videos_failed: u64,
    pub videos_empty: u64,
    pub detections_ingested: u64,
    pub tracks_seen: u64,
    pub tracks_dropped: u64,
    pub summaries_written: u64,
    pub elapsed_secs: f64,
}
