//! Run settings and output path resolution.

use std::path::PathBuf;

use sensor_anomaly::{PipelineConfig, DEFAULT_MODEL_SEED, DEFAULT_NOISE_SEED};

/// Output directory used when none is given, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Resolve the output directory.
pub fn resolve_output_dir(explicit: Option<&str>) -> PathBuf {
    match explicit {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
    }
}

/// Everything one run needs, after argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub noise_seed: u64,
    pub model_seed: u64,
    pub display: bool,
    pub save_chart: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output_dir: resolve_output_dir(None),
            noise_seed: DEFAULT_NOISE_SEED,
            model_seed: DEFAULT_MODEL_SEED,
            display: true,
            save_chart: None,
        }
    }
}

impl RunSettings {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::with_seeds(self.noise_seed, self.model_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_dir() {
        assert_eq!(resolve_output_dir(None), PathBuf::from("outputs"));
        assert_eq!(resolve_output_dir(Some("  ")), PathBuf::from("outputs"));
        assert_eq!(resolve_output_dir(Some("/tmp/x")), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_default_settings_match_fixed_pipeline() {
        let settings = RunSettings::default();
        assert_eq!(settings.pipeline_config(), PipelineConfig::default());
        assert!(settings.display);
        assert!(settings.save_chart.is_none());
    }
}
