// src/pipeline/orchestrator.rs
//
// One video end to end: flatten tracker output → classify frames →
// aggregate tracks → persist CSV. Each VideoPipeline call owns its stream,
// map and summaries; only the run metrics are shared between videos.

use super::metrics::RunMetrics;
use crate::analysis::{effective_fps, CongestionMap, TrajectoryAggregator, TrajectoryParams};
use crate::ingest::TrackerOutput;
use crate::report;
use crate::storage::ReportStore;
use crate::types::{AnalysisConfig, Congestion, FrameCongestion, OutputConfig, VehicleSummary};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

const FRAME_REPORT_SUFFIX: &str = "_frame_congestion.csv";

#[derive(Debug, Clone)]
pub struct VideoReport {
    pub source_name: String,
    pub fps: f64,
    pub detections: usize,
    pub frames: Vec<FrameCongestion>,
    pub summaries: Vec<VehicleSummary>,
    pub tracks_seen: usize,
    pub tracks_dropped: usize,
}

impl VideoReport {
    pub fn has_vehicles(&self) -> bool {
        !self.summaries.is_empty()
    }

    pub fn high_congestion_frames(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.congestion == Congestion::High)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    Written { name: String, vehicles: usize },
    /// Nothing to persist: empty stream, or every track was filtered out
    NoVehicles,
}

pub struct VideoPipeline {
    analysis: AnalysisConfig,
    output: OutputConfig,
    aggregator: TrajectoryAggregator,
    metrics: RunMetrics,
    /// Report names already written during this run
    claimed: Mutex<HashSet<String>>,
}

impl VideoPipeline {
    pub fn new(analysis: AnalysisConfig, output: OutputConfig, metrics: RunMetrics) -> Self {
        let aggregator = TrajectoryAggregator::new(TrajectoryParams::from(&analysis));
        Self {
            analysis,
            output,
            aggregator,
            metrics,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Pure analysis of one video's tracker output.
    pub fn process(&self, output: &TrackerOutput) -> Result<VideoReport> {
        let source_name = output.source_name();
        let detections = output.flatten();
        let fps = effective_fps(output.fps, self.analysis.default_fps);

        let congestion = CongestionMap::build(&detections, self.analysis.congestion_threshold);
        let (summaries, stats) = self
            .aggregator
            .aggregate_with_stats(&detections, &congestion, Some(fps))
            .with_context(|| format!("aggregating tracks for {}", source_name))?;

        Ok(VideoReport {
            source_name,
            fps,
            detections: detections.len(),
            frames: congestion.records().cloned().collect(),
            summaries,
            tracks_seen: stats.tracks_seen,
            tracks_dropped: stats.tracks_dropped,
        })
    }

    /// Analyse and persist under the source's own name.
    pub fn run(&self, output: &TrackerOutput, store: &dyn ReportStore) -> Result<VideoOutcome> {
        self.run_as(output, &output.source_name(), store)
    }

    /// Analyse and persist under `base_name`. Empty results are skipped, not
    /// written. A name already used in this run is rejected so one video can
    /// never overwrite another's report.
    pub fn run_as(
        &self,
        output: &TrackerOutput,
        base_name: &str,
        store: &dyn ReportStore,
    ) -> Result<VideoOutcome> {
        let report = self.process(output)?;

        self.metrics
            .add(&self.metrics.detections_ingested, report.detections as u64);
        self.metrics
            .add(&self.metrics.tracks_seen, report.tracks_seen as u64);
        self.metrics
            .add(&self.metrics.tracks_dropped, report.tracks_dropped as u64);

        info!(
            "{}: {} frames, {} detections, {} high-congestion frames, {} tracks ({} dropped) @ {:.2} FPS",
            report.source_name,
            output.frame_count(),
            report.detections,
            report.high_congestion_frames(),
            report.tracks_seen,
            report.tracks_dropped,
            report.fps
        );

        if !report.has_vehicles() {
            warn!("{}: No vehicles detected, skipping report", report.source_name);
            self.metrics.inc(&self.metrics.videos_empty);
            return Ok(VideoOutcome::NoVehicles);
        }

        let name = report_name(base_name, &self.output.suffix);
        self.claim(&name)?;
        store.put(&name, report::vehicle_csv(&report.summaries).as_bytes())?;

        if self.output.write_frame_report {
            let frame_name = report_name(base_name, FRAME_REPORT_SUFFIX);
            self.claim(&frame_name)?;
            store.put(&frame_name, report::frame_csv(&report.frames).as_bytes())?;
        }

        self.metrics.add(
            &self.metrics.summaries_written,
            report.summaries.len() as u64,
        );

        Ok(VideoOutcome::Written {
            name,
            vehicles: report.summaries.len(),
        })
    }

    /// Load a detection file found under `root` and run it. Failures are
    /// counted before being returned so one bad file does not hide in the
    /// totals.
    pub fn run_file(&self, root: &Path, path: &Path, store: &dyn ReportStore) -> Result<VideoOutcome> {
        let result = TrackerOutput::load(path).and_then(|output| {
            let base_name = report_base_name(root, path, &output);
            self.run_as(&output, &base_name, store)
        });
        match &result {
            Ok(_) => self.metrics.inc(&self.metrics.videos_processed),
            Err(_) => self.metrics.inc(&self.metrics.videos_failed),
        }
        result
    }

    fn claim(&self, name: &str) -> Result<()> {
        let mut claimed = self
            .claimed
            .lock()
            .map_err(|_| anyhow!("report name registry poisoned"))?;
        if !claimed.insert(name.to_string()) {
            bail!("report {} was already written by another input in this run", name);
        }
        Ok(())
    }
}

pub fn report_name(source_name: &str, suffix: &str) -> String {
    format!("{}{}", source_name, suffix)
}

/// Source name prefixed with the file's directories below `root`, so
/// `day1/cam01.json` and `day2/cam01.json` land in different reports.
pub fn report_base_name(root: &Path, path: &Path, output: &TrackerOutput) -> String {
    let mut parts: Vec<String> = path
        .strip_prefix(root)
        .ok()
        .and_then(|rel| rel.parent())
        .map(|dir| {
            dir.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    parts.push(output.source_name());
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DirectoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        puts: Mutex<Vec<(String, String)>>,
    }

    impl ReportStore for MemoryStore {
        fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
            self.puts
                .lock()
                .map_err(|_| anyhow::anyhow!("store lock poisoned"))?
                .push((name.to_string(), String::from_utf8_lossy(bytes).into_owned()));
            Ok(())
        }
    }

    fn pipeline() -> VideoPipeline {
        VideoPipeline::new(
            AnalysisConfig::default(),
            OutputConfig::default(),
            RunMetrics::new(),
        )
    }

    fn two_point_video() -> TrackerOutput {
        TrackerOutput::from_json_str(
            r#"{ "source": "cam.mp4", "fps": 30.0, "frames": [
                { "frame_index": 0, "detections": [
                    { "track_id": 1, "label": "car", "cx": 0.0, "cy": 0.0 },
                    { "track_id": 2, "label": "truck", "cx": 0.0, "cy": 0.0 } ] },
                { "frame_index": 29, "detections": [
                    { "track_id": 1, "label": "car", "cx": 100.0, "cy": 0.0 } ] }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_process_builds_report() {
        let report = pipeline().process(&two_point_video()).unwrap();
        assert_eq!(report.source_name, "cam.mp4");
        assert_eq!(report.detections, 3);
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.tracks_seen, 2);
        assert_eq!(report.tracks_dropped, 1);
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].speed_kmph, 18.0);
        assert_eq!(report.summaries[0].congestion, Congestion::Normal);
    }

    #[test]
    fn test_run_writes_csv() {
        let store = MemoryStore::default();
        let p = pipeline();
        let outcome = p.run(&two_point_video(), &store).unwrap();

        assert_eq!(
            outcome,
            VideoOutcome::Written {
                name: "cam.mp4_vehicle_data.csv".to_string(),
                vehicles: 1
            }
        );
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(
            puts[0].1,
            "id,label,entry_frame,exit_frame,total_frames,speed_kmph,congestion\n1,car,0,29,30,18.0,Normal\n"
        );
        assert_eq!(p.metrics().summary().summaries_written, 1);
    }

    #[test]
    fn test_empty_stream_skips_persistence() {
        let store = MemoryStore::default();
        let p = pipeline();
        let output = TrackerOutput::from_json_str(r#"{ "source": "empty.mp4", "frames": [] }"#).unwrap();

        let report = p.process(&output).unwrap();
        assert!(report.frames.is_empty());
        assert!(report.summaries.is_empty());

        assert_eq!(p.run(&output, &store).unwrap(), VideoOutcome::NoVehicles);
        assert!(store.puts.lock().unwrap().is_empty());
        assert_eq!(p.metrics().summary().videos_empty, 1);
    }

    #[test]
    fn test_frame_report_optional() {
        let store = MemoryStore::default();
        let output_config = OutputConfig {
            write_frame_report: true,
            ..OutputConfig::default()
        };
        let p = VideoPipeline::new(AnalysisConfig::default(), output_config, RunMetrics::new());
        p.run(&two_point_video(), &store).unwrap();

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].0, "cam.mp4_frame_congestion.csv");
        assert_eq!(puts[1].1, "frame,vehicle_count,congestion\n0,2,Normal\n29,1,Normal\n");
    }

    #[test]
    fn test_output_is_byte_identical_across_runs() {
        let a = MemoryStore::default();
        let b = MemoryStore::default();
        pipeline().run(&two_point_video(), &a).unwrap();
        pipeline().run(&two_point_video(), &b).unwrap();
        assert_eq!(*a.puts.lock().unwrap(), *b.puts.lock().unwrap());
    }

    #[test]
    fn test_same_name_twice_in_one_run_fails() {
        let store = MemoryStore::default();
        let p = pipeline();
        p.run(&two_point_video(), &store).unwrap();
        let err = p.run(&two_point_video(), &store).unwrap_err();
        assert!(err.to_string().contains("cam.mp4_vehicle_data.csv"));
        assert_eq!(store.puts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_nested_files_with_same_stem_get_distinct_reports() {
        let root = std::env::temp_dir().join(format!("traffic_nested_{}", std::process::id()));
        let json = r#"{ "fps": 30.0, "frames": [
            { "detections": [ { "track_id": 1, "label": "car", "cx": 0.0, "cy": 0.0 } ] },
            { "detections": [ { "track_id": 1, "label": "car", "cx": 9.0, "cy": 0.0 } ] } ] }"#;
        for day in ["day1", "day2"] {
            std::fs::create_dir_all(root.join(day)).unwrap();
            std::fs::write(root.join(day).join("cam01.json"), json).unwrap();
        }

        let out = root.join("out");
        let store = DirectoryStore::new(&out);
        let p = pipeline();
        let first = p.run_file(&root, &root.join("day1").join("cam01.json"), &store).unwrap();
        let second = p.run_file(&root, &root.join("day2").join("cam01.json"), &store).unwrap();

        assert_eq!(
            first,
            VideoOutcome::Written {
                name: "day1_cam01_vehicle_data.csv".to_string(),
                vehicles: 1
            }
        );
        assert_eq!(
            second,
            VideoOutcome::Written {
                name: "day2_cam01_vehicle_data.csv".to_string(),
                vehicles: 1
            }
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_top_level_file_keeps_plain_name() {
        let output = two_point_video();
        let root = Path::new("/data/detections");
        assert_eq!(report_base_name(root, &root.join("x.json"), &output), "cam.mp4");
        assert_eq!(
            report_base_name(root, &root.join("a").join("b").join("x.json"), &output),
            "a_b_cam.mp4"
        );
    }

    #[test]
    fn test_run_file_counts_failures() {
        let root = std::env::temp_dir().join(format!("traffic_pipeline_{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let bad = root.join("bad.json");
        std::fs::write(&bad, "not json").unwrap();

        let store = DirectoryStore::new(root.join("out"));
        let p = pipeline();
        assert!(p.run_file(&root, &bad, &store).is_err());
        assert!(p.run_file(&root, &root.join("missing.json"), &store).is_err());
        assert_eq!(p.metrics().summary().videos_failed, 2);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
