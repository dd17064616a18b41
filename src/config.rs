// src/config.rs

use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if !analysis.pixel_to_meter_scale.is_finite() || analysis.pixel_to_meter_scale <= 0.0 {
            bail!(
                "analysis.pixel_to_meter_scale must be positive, got {}",
                analysis.pixel_to_meter_scale
            );
        }
        if !analysis.default_fps.is_finite() || analysis.default_fps <= 0.0 {
            bail!("analysis.default_fps must be positive, got {}", analysis.default_fps);
        }
        // A single sighting has no displacement to measure
        if analysis.min_observations < 2 {
            bail!(
                "analysis.min_observations must be at least 2, got {}",
                analysis.min_observations
            );
        }
        if self.output.suffix.is_empty() {
            bail!("output.suffix must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.analysis.congestion_threshold, 10);
        assert_eq!(config.analysis.pixel_to_meter_scale, 0.05);
        assert_eq!(config.analysis.default_fps, 30.0);
        assert_eq!(config.output.suffix, "_vehicle_data.csv");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_override() {
        let yaml = "analysis:\n  congestion_threshold: 4\noutput:\n  output_dir: out\n";
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.analysis.congestion_threshold, 4);
        assert_eq!(config.analysis.pixel_to_meter_scale, 0.05);
        assert_eq!(config.output.output_dir, "out");
        assert!(!config.output.write_frame_report);
    }

    #[test]
    fn test_rejects_bad_scale() {
        let yaml = "analysis:\n  pixel_to_meter_scale: 0.0\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_single_observation_policy() {
        let yaml = "analysis:\n  min_observations: 1\n";
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load("/nonexistent/traffic/config.yaml").is_err());
    }
}
