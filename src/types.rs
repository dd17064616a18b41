// src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frames with more detections than this are `High` congestion
    pub congestion_threshold: usize,
    /// Fixed ground distance covered by one pixel, in meters
    pub pixel_to_meter_scale: f64,
    /// Substituted whenever the video reports an unusable frame rate
    pub default_fps: f64,
    /// Tracks with fewer observations are dropped
    pub min_observations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            congestion_threshold: 10,
            pixel_to_meter_scale: 0.05,
            default_fps: 30.0,
            min_observations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub detections_dir: String,
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            detections_dir: "detections".to_string(),
            extensions: vec!["json".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: String,
    pub suffix: String,
    pub write_frame_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "csv-results".to_string(),
            suffix: "_vehicle_data.csv".to_string(),
            write_frame_report: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One tracked object observed at one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frame_index: u64,
    pub track_id: i64,
    pub label: String,
    /// Centroid in pixel coordinates
    pub center: (f64, f64),
}

impl Detection {
    pub fn new(frame_index: u64, track_id: i64, label: impl Into<String>, cx: f64, cy: f64) -> Self {
        Self {
            frame_index,
            track_id,
            label: label.into(),
            center: (cx, cy),
        }
    }

    pub fn has_finite_center(&self) -> bool {
        self.center.0.is_finite() && self.center.1.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Congestion {
    High,
    Normal,
    /// Frame missing from the congestion map
    Unknown,
}

impl Congestion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Congestion::High => "High",
            Congestion::Normal => "Normal",
            Congestion::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Congestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameCongestion {
    pub frame_index: u64,
    pub vehicle_count: usize,
    pub congestion: Congestion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSummary {
    pub track_id: i64,
    pub label: String,
    pub entry_frame: u64,
    pub exit_frame: u64,
    pub total_frames: u64,
    pub speed_kmph: f64,
    pub congestion: Congestion,
}
