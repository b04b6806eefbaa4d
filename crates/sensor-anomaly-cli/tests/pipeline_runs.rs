//! End-to-end runs of the CLI pipeline against temporary output directories.

use std::path::Path;

use chrono::Duration;
use sensor_anomaly::{CsvImporter, Label, Summary, SUMMARY_COLUMNS};
use sensor_anomaly_cli::{run, RunSettings};

// ─────────────────────── helpers ───────────────────────

/// Headless settings writing into `dir`.
fn settings_in(dir: &Path) -> RunSettings {
    RunSettings {
        output_dir: dir.to_path_buf(),
        display: false,
        ..RunSettings::default()
    }
}

fn mean(vals: impl Iterator<Item = f64>) -> f64 {
    let vals: Vec<f64> = vals.collect();
    vals.iter().sum::<f64>() / vals.len() as f64
}

// ─────────────────────── outputs ───────────────────────

#[test]
fn writes_both_files_into_fresh_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("outputs");
    assert!(!out.exists());

    let files = run(&settings_in(&out)).unwrap();

    assert!(out.is_dir());
    assert_eq!(files.observations, out.join("environmental_anomalies.csv"));
    assert_eq!(files.summary, out.join("summary_report.csv"));
    assert!(files.observations.is_file());
    assert!(files.summary.is_file());
}

#[test]
fn existing_output_directory_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keep.txt"), "x").unwrap();

    run(&settings_in(dir.path())).unwrap();
    run(&settings_in(dir.path())).unwrap();

    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn observation_table_has_168_hourly_rows() {
    let dir = tempfile::tempdir().unwrap();
    let files = run(&settings_in(dir.path())).unwrap();
    let series = CsvImporter::read_observations_from_file(&files.observations).unwrap();

    assert_eq!(series.len(), 168);
    for pair in series.observations().windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
    }
    let anomalies = series.anomaly_count();
    assert!(anomalies <= series.len());
    assert!(series
        .labels()
        .iter()
        .all(|l| matches!(l, Label::Normal | Label::Anomalous)));
}

#[test]
fn summary_table_has_one_row_and_four_columns() {
    let dir = tempfile::tempdir().unwrap();
    let files = run(&settings_in(dir.path())).unwrap();

    let text = std::fs::read_to_string(&files.summary).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], SUMMARY_COLUMNS.join(","));
    assert_eq!(lines[1].split(',').count(), 4);

    let summary = CsvImporter::read_summary_from_file(&files.summary).unwrap();
    assert_eq!(summary.total_anomalies, 17);
    assert!(lines[1].ends_with(",17"));
}

// ─────────────────────── consistency ───────────────────────

#[test]
fn summary_matches_means_recomputed_from_table() {
    let dir = tempfile::tempdir().unwrap();
    let files = run(&settings_in(dir.path())).unwrap();

    let series = CsvImporter::read_observations_from_file(&files.observations).unwrap();
    let summary = CsvImporter::read_summary_from_file(&files.summary).unwrap();
    let obs = series.observations();

    assert!((mean(obs.iter().map(|o| o.temperature)) - summary.avg_temperature).abs() < 1e-9);
    assert!((mean(obs.iter().map(|o| o.humidity)) - summary.avg_humidity).abs() < 1e-9);
    assert!((mean(obs.iter().map(|o| o.light)) - summary.avg_light).abs() < 1e-9);
    assert_eq!(series.anomaly_count(), summary.total_anomalies);
    assert_eq!(Summary::from_series(&series).total_anomalies, summary.total_anomalies);
}

#[test]
fn same_seeds_give_byte_identical_files() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let fa = run(&settings_in(a.path())).unwrap();
    let fb = run(&settings_in(b.path())).unwrap();

    assert_eq!(
        std::fs::read(&fa.observations).unwrap(),
        std::fs::read(&fb.observations).unwrap()
    );
    assert_eq!(
        std::fs::read(&fa.summary).unwrap(),
        std::fs::read(&fb.summary).unwrap()
    );
}

#[test]
fn different_noise_seed_changes_table() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let fa = run(&settings_in(a.path())).unwrap();
    let fb = run(&RunSettings {
        noise_seed: 7,
        ..settings_in(b.path())
    })
    .unwrap();

    assert_ne!(
        std::fs::read(&fa.observations).unwrap(),
        std::fs::read(&fb.observations).unwrap()
    );
}

#[test]
fn injected_anomalies_are_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let files = run(&settings_in(dir.path())).unwrap();
    let series = CsvImporter::read_observations_from_file(&files.observations).unwrap();

    assert_eq!(series.labels()[50], Label::Anomalous);
    assert_eq!(series.labels()[120], Label::Anomalous);
    assert_eq!(series.labels()[140], Label::Anomalous);
}

// ─────────────────────── chart ───────────────────────

#[test]
fn save_chart_writes_readable_png() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("chart.png");
    run(&RunSettings {
        save_chart: Some(chart.clone()),
        ..settings_in(dir.path())
    })
    .unwrap();

    let img = image::open(&chart).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (1000, 400));
}
