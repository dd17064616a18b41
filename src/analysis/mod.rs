// src/analysis/mod.rs
//
// Core aggregation. Both stages are pure functions of their inputs:
//
//   Detections → congestion::classify_frames → CongestionMap ─┐
//   Detections ───────────────────────────────────────────────┴→ trajectory → VehicleSummary
//
// Speed math lives in velocity.

pub mod congestion;
pub mod trajectory;
pub mod velocity;

pub use congestion::{classify_frames, CongestionMap, DEFAULT_CONGESTION_THRESHOLD};
pub use trajectory::{
    dominant_congestion, group_by_track, AggregationStats, TrajectoryAggregator, TrajectoryParams,
};
pub use velocity::{effective_fps, estimate_speed_kmph, DEFAULT_FPS, DEFAULT_PIXEL_TO_METER};
