//! One end-to-end run: pipeline, report, chart, export.

use anyhow::Context;

use sensor_anomaly::{
    export_all, render_temperature_chart, run_pipeline, save_chart, ChartOptions, ExportedFiles,
};

use crate::config::RunSettings;
use crate::report::{saved_report, summary_report};
use crate::viewer;

/// Run the pipeline once and write the outputs.
///
/// Prints the summary, shows the chart (blocking) when enabled, then writes
/// both CSV files and prints their names.
pub fn run(settings: &RunSettings) -> anyhow::Result<ExportedFiles> {
    let output = run_pipeline(&settings.pipeline_config()).context("Pipeline failed")?;
    println!("{}", summary_report(&output.summary));

    if settings.display || settings.save_chart.is_some() {
        let options = ChartOptions::default();
        let chart = render_temperature_chart(&output.series, &options)
            .context("Failed to render chart")?;

        if let Some(path) = &settings.save_chart {
            save_chart(&chart, path)
                .with_context(|| format!("Failed to save chart to {}", path.display()))?;
        }
        if settings.display {
            viewer::show(&chart, &options.title)?;
        }
    }

    let files = export_all(&settings.output_dir, &output.series, &output.summary)
        .with_context(|| format!("Failed to export to {}", settings.output_dir.display()))?;
    println!("{}", saved_report(&files));
    Ok(files)
}
