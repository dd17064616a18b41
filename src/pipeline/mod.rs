// src/pipeline/mod.rs

pub mod metrics;
pub mod orchestrator;

pub use metrics::{MetricsSummary, RunMetrics};
pub use orchestrator::{VideoOutcome, VideoPipeline, VideoReport};
