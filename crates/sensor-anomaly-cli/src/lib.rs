//! sensor-anomaly CLI: run the pipeline, show the chart, export the CSVs.

pub mod config;
pub mod report;
pub mod runner;
pub mod viewer;

pub use config::{resolve_output_dir, RunSettings};
pub use runner::run;
