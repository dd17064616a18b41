// src/main.rs

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use traffic_trajectory::ingest::find_detection_files;
use traffic_trajectory::{Config, DirectoryStore, RunMetrics, VideoOutcome, VideoPipeline};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TRAFFIC_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
        .into()
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(config_path())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("traffic_trajectory={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚗 Traffic trajectory summaries starting");
    info!(
        "Congestion threshold: {} vehicles, scale: {} m/px, default FPS: {:.1}",
        config.analysis.congestion_threshold,
        config.analysis.pixel_to_meter_scale,
        config.analysis.default_fps
    );

    let files = find_detection_files(&config.input.detections_dir, &config.input.extensions)?;
    if files.is_empty() {
        warn!("No detection files found in {}", config.input.detections_dir);
        return Ok(());
    }

    let metrics = RunMetrics::new();
    let pipeline = Arc::new(VideoPipeline::new(
        config.analysis.clone(),
        config.output.clone(),
        metrics.clone(),
    ));
    let store = Arc::new(DirectoryStore::new(&config.output.output_dir));
    let root = Arc::new(PathBuf::from(&config.input.detections_dir));

    // Videos share nothing but the metrics, so each runs on its own blocking task
    let mut tasks = JoinSet::new();
    for path in files {
        let pipeline = Arc::clone(&pipeline);
        let store = Arc::clone(&store);
        let root = Arc::clone(&root);
        tasks.spawn_blocking(move || {
            let outcome = pipeline.run_file(&root, &path, store.as_ref());
            (path, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(VideoOutcome::Written { name, vehicles }))) => {
                info!("✓ {} → {} ({} vehicles)", path.display(), name, vehicles);
            }
            Ok((path, Ok(VideoOutcome::NoVehicles))) => {
                info!("∅ {}: nothing to report", path.display());
            }
            Ok((path, Err(e))) => {
                error!("Failed to process {}: {:#}", path.display(), e);
            }
            Err(e) => {
                error!("Video task panicked: {}", e);
                metrics.inc(&metrics.videos_failed);
            }
        }
    }

    let summary = metrics.summary();
    info!("Run summary: {}", serde_json::to_string(&summary)?);
    info!(
        "Processed {} video(s): {} written summaries, {} empty, {} failed",
        summary.videos_processed,
        summary.summaries_written,
        summary.videos_empty,
        summary.videos_failed
    );

    Ok(())
}
