// src/analysis/trajectory.rs
//
// Per-track aggregation: dwell span, entry-to-exit speed and dominant
// congestion for every track seen at least `min_observations` times.
//
// Tracks are emitted in order of first appearance in the incoming stream,
// not by track id, so output order follows the tracker's own ordering.

use super::congestion::CongestionMap;
use super::velocity::{self, DEFAULT_FPS, DEFAULT_PIXEL_TO_METER};
use crate::types::{AnalysisConfig, Congestion, Detection, VehicleSummary};
use anyhow::{bail, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct TrajectoryParams {
    pub pixel_to_meter_scale: f64,
    pub default_fps: f64,
    pub min_observations: usize,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            pixel_to_meter_scale: DEFAULT_PIXEL_TO_METER,
            default_fps: DEFAULT_FPS,
            min_observations: 2,
        }
    }
}

impl From<&AnalysisConfig> for TrajectoryParams {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            pixel_to_meter_scale: config.pixel_to_meter_scale,
            default_fps: config.default_fps,
            min_observations: config.min_observations,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub tracks_seen: usize,
    pub tracks_dropped: usize,
}

pub struct TrajectoryAggregator {
    params: TrajectoryParams,
}

impl TrajectoryAggregator {
    pub fn new(params: TrajectoryParams) -> Self {
        Self { params }
    }

    pub fn aggregate(
        &self,
        detections: &[Detection],
        congestion: &CongestionMap,
        fps: Option<f64>,
    ) -> Result<Vec<VehicleSummary>> {
        self.aggregate_with_stats(detections, congestion, fps)
            .map(|(summaries, _)| summaries)
    }

    pub fn aggregate_with_stats(
        &self,
        detections: &[Detection],
        congestion: &CongestionMap,
        fps: Option<f64>,
    ) -> Result<(Vec<VehicleSummary>, AggregationStats)> {
        if detections.is_empty() {
            return Ok((Vec::new(), AggregationStats::default()));
        }

        let fps = velocity::effective_fps(fps, self.params.default_fps);
        let tracks = group_by_track(detections);
        let mut stats = AggregationStats {
            tracks_seen: tracks.len(),
            tracks_dropped: 0,
        };

        let mut summaries = Vec::with_capacity(tracks.len());
        for (track_id, observations) in tracks {
            if observations.len() < self.params.min_observations {
                trace!(
                    "Dropping track {} with {} observation(s)",
                    track_id,
                    observations.len()
                );
                stats.tracks_dropped += 1;
                continue;
            }
            summaries.push(self.summarize(track_id, &observations, congestion, fps)?);
        }

        debug!(
            "Aggregated {} tracks at {:.2} FPS: {} summaries, {} dropped",
            stats.tracks_seen,
            fps,
            summaries.len(),
            stats.tracks_dropped
        );
        Ok((summaries, stats))
    }

    /// `observations` must be sorted by frame and hold at least one entry.
    fn summarize(
        &self,
        track_id: i64,
        observations: &[&Detection],
        congestion: &CongestionMap,
        fps: f64,
    ) -> Result<VehicleSummary> {
        if let Some(bad) = observations.iter().find(|d| !d.has_finite_center()) {
            bail!(
                "track {} has a non-finite center {:?} at frame {}",
                track_id,
                bad.center,
                bad.frame_index
            );
        }

        let (first, last) = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => bail!("track {} has no observations", track_id),
        };

        let entry_frame = first.frame_index;
        let exit_frame = last.frame_index;
        let total_frames = match (exit_frame - entry_frame).checked_add(1) {
            Some(n) => n,
            None => bail!(
                "track {} spans frames {}..={}, too long to count",
                track_id,
                entry_frame,
                exit_frame
            ),
        };

        let speed_kmph = velocity::estimate_speed_kmph(
            first.center,
            last.center,
            total_frames,
            fps,
            self.params.pixel_to_meter_scale,
        );

        let dominant = dominant_congestion(
            observations
                .iter()
                .map(|d| congestion.category(d.frame_index)),
        );

        Ok(VehicleSummary {
            track_id,
            label: first.label.clone(),
            entry_frame,
            exit_frame,
            total_frames,
            speed_kmph,
            congestion: dominant,
        })
    }
}

impl Default for TrajectoryAggregator {
    fn default() -> Self {
        Self::new(TrajectoryParams::default())
    }
}

/// Group detections by track, keeping tracks in first-appearance order and
/// each track's observations sorted by frame (stable for equal frames).
pub fn group_by_track(detections: &[Detection]) -> Vec<(i64, Vec<&Detection>)> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut tracks: Vec<(i64, Vec<&Detection>)> = Vec::new();

    for det in detections {
        let slot = *index.entry(det.track_id).or_insert_with(|| {
            tracks.push((det.track_id, Vec::new()));
            tracks.len() - 1
        });
        tracks[slot].1.push(det);
    }

    for (_, observations) in tracks.iter_mut() {
        observations.sort_by_key(|d| d.frame_index);
    }
    tracks
}

/// Most frequent category. On a tie the category seen first wins, so callers
/// pass categories in frame order to get earliest-frame-wins.
pub fn dominant_congestion(categories: impl IntoIterator<Item = Congestion>) -> Congestion {
    let mut tally: Vec<(Congestion, usize)> = Vec::with_capacity(3);
    for category in categories {
        match tally.iter_mut().find(|(c, _)| *c == category) {
            Some((_, count)) => *count += 1,
            None => tally.push((category, 1)),
        }
    }

    tally
        .into_iter()
        .fold(None, |best: Option<(Congestion, usize)>, (c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
        .unwrap_or(Congestion::Unknown)
}
