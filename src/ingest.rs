// src/ingest.rs
//
// Reads the tracker's per-frame output for one video and flattens it into the
// detection stream the analysis stages consume.

use crate::types::Detection;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerOutput {
    /// Name of the video the detections came from
    #[serde(default)]
    pub source: Option<String>,
    /// As reported by the video; may be missing or zero
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub frames: Vec<FrameDetections>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameDetections {
    /// Defaults to the frame's position in the sequence
    #[serde(default)]
    pub frame_index: Option<u64>,
    #[serde(default)]
    pub detections: Vec<TrackedBox>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackedBox {
    /// `None` when the tracker has not assigned an identity yet
    pub track_id: Option<i64>,
    pub label: String,
    pub cx: f64,
    pub cy: f64,
}

impl TrackerOutput {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading detections {}", path.display()))?;
        let mut output = Self::from_json_str(&contents)
            .with_context(|| format!("parsing detections {}", path.display()))?;

        if output.source.is_none() {
            output.source = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        }
        Ok(output)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Source name without any directory components.
    pub fn source_name(&self) -> String {
        self.source
            .as_deref()
            .and_then(|s| Path::new(s).file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Detection stream in tracker order. Untracked boxes are skipped but
    /// their frames still advance the frame counter.
    pub fn flatten(&self) -> Vec<Detection> {
        let mut detections = Vec::new();
        let mut skipped = 0usize;

        for (position, frame) in self.frames.iter().enumerate() {
            let frame_index = frame.frame_index.unwrap_or(position as u64);
            for tracked in &frame.detections {
                match tracked.track_id {
                    Some(track_id) => detections.push(Detection::new(
                        frame_index,
                        track_id,
                        tracked.label.as_str(),
                        tracked.cx,
                        tracked.cy,
                    )),
                    None => skipped += 1,
                }
            }
        }

        debug!(
            "Flattened {} frames into {} detections ({} untracked skipped)",
            self.frames.len(),
            detections.len(),
            skipped
        );
        detections
    }
}

pub fn find_detection_files(dir: impl AsRef<Path>, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        anyhow::bail!("detections directory {} does not exist", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if matches {
            files.push(path.to_path_buf());
        }
    }

    info!("Found {} detection file(s) in {}", files.len(), dir.display());
    Ok(files)
}
