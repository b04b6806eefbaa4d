//! Console text printed around a run.

use sensor_anomaly::{ExportedFiles, Summary};

/// Summary table under its heading.
pub fn summary_report(summary: &Summary) -> String {
    format!("\n📊 Environmental Summary Report:\n{summary}")
}

/// Confirmation naming the output folder and both written files.
pub fn saved_report(files: &ExportedFiles) -> String {
    let folder = files
        .observations
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let name = |p: &std::path::Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.display().to_string())
    };
    format!(
        "\n✅ Data and summary saved in the '{folder}' folder:\n - {}\n - {}",
        name(files.observations.as_path()),
        name(files.summary.as_path())
    )
}
