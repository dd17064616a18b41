// src/lib.rs
//
// Trajectory summaries for tracked vehicles: per-frame congestion, per-track
// dwell span, entry-to-exit speed and dominant congestion.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use analysis::{CongestionMap, TrajectoryAggregator, TrajectoryParams};
pub use ingest::TrackerOutput;
pub use pipeline::{RunMetrics, VideoOutcome, VideoPipeline};
pub use storage::{DirectoryStore, ReportStore};
pub use types::{Config, Congestion, Detection, FrameCongestion, VehicleSummary};
