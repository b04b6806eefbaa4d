//! sensor-anomaly: synthetic environmental readings, isolation forest scoring, summaries and CSV export.

pub mod chart;
pub mod export;
pub mod forest;
pub mod generator;
pub mod pipeline;
pub mod summary;
pub mod types;

pub use chart::{render_temperature_chart, save_chart, ChartOptions};
pub use export::{
    ensure_output_dir, export_all, CsvExporter, CsvImporter, ExportedFiles, OBSERVATIONS_FILE,
    SUMMARY_FILE,
};
pub use forest::{
    label_series, Contamination, ForestConfig, IsolationForest, MaxSamples, DEFAULT_MODEL_SEED,
};
pub use generator::{generate, AnomalyInjection, GeneratorConfig, DEFAULT_NOISE_SEED};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
pub use summary::SUMMARY_COLUMNS;
pub use types::*;
