// src/analysis/congestion.rs
//
// Per-frame congestion classification. Every frame is judged on its own
// detection count; there is no smoothing across neighbouring frames.

use crate::types::{Congestion, Detection, FrameCongestion};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_CONGESTION_THRESHOLD: usize = 10;

/// Count detections per frame and classify each frame.
///
/// Duplicate (frame, track) detections are counted individually. Records are
/// returned in ascending frame order, one per distinct frame in the input.
pub fn classify_frames(detections: &[Detection], threshold: usize) -> Vec<FrameCongestion> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for det in detections {
        *counts.entry(det.frame_index).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(frame_index, vehicle_count)| FrameCongestion {
            frame_index,
            vehicle_count,
            congestion: classify_count(vehicle_count, threshold),
        })
        .collect()
}

pub fn classify_count(vehicle_count: usize, threshold: usize) -> Congestion {
    if vehicle_count > threshold {
        Congestion::High
    } else {
        Congestion::Normal
    }
}

/// Frame index → congestion lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CongestionMap {
    frames: BTreeMap<u64, FrameCongestion>,
}

impl CongestionMap {
    pub fn build(detections: &[Detection], threshold: usize) -> Self {
        let map = Self::from_records(classify_frames(detections, threshold));
        debug!(
            "Congestion map: {} frames, {} high (threshold {})",
            map.len(),
            map.high_frames(),
            threshold
        );
        map
    }

    pub fn from_records(records: impl IntoIterator<Item = FrameCongestion>) -> Self {
        Self {
            frames: records.into_iter().map(|r| (r.frame_index, r)).collect(),
        }
    }

    /// Frames never classified come back as `Unknown`.
    pub fn category(&self, frame_index: u64) -> Congestion {
        self.frames
            .get(&frame_index)
            .map(|r| r.congestion)
            .unwrap_or(Congestion::Unknown)
    }

    pub fn records(&self) -> impl Iterator<Item = &FrameCongestion> {
        self.frames.values()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn high_frames(&self) -> usize {
        self.frames
            .values()
            .filter(|r| r.congestion == Congestion::High)
            .count()
    }
}
