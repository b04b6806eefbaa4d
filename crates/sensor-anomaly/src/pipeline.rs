//! Generate → label → summarize, as one call.

use crate::forest::{label_series, ForestConfig};
use crate::generator::{generate, GeneratorConfig};
use crate::types::{EnvResult, LabeledSeries, Summary};

/// Both halves of the pipeline's configuration. Each carries its own seed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub forest: ForestConfig,
}

impl PipelineConfig {
    /// Default pipeline with explicit noise and model seeds.
    pub fn with_seeds(noise_seed: u64, model_seed: u64) -> Self {
        Self {
            generator: GeneratorConfig::with_seed(noise_seed),
            forest: ForestConfig::with_seed(model_seed),
        }
    }
}

/// Labelled table and its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub series: LabeledSeries,
    pub summary: Summary,
}

/// Run the in-memory stages. Output depends only on `config`.
pub fn run_pipeline(config: &PipelineConfig) -> EnvResult<PipelineOutput> {
    let series = generate(&config.generator)?;
    let series = label_series(series, &config.forest)?;
    let summary = Summary::from_series(&series);
    tracing::info!(
        "Pipeline finished: {} rows, {} anomalies",
        series.len(),
        summary.total_anomalies
    );
    Ok(PipelineOutput { series, summary })
}
