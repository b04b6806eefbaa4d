//! CSV export of the labelled table and the summary row.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::summary::SUMMARY_COLUMNS;
use crate::types::{
    EnvError, EnvResult, Label, LabeledSeries, Observation, Signal, Summary, TIMESTAMP_FORMAT,
};

/// File name of the labelled observation table.
pub const OBSERVATIONS_FILE: &str = "environmental_anomalies.csv";

/// File name of the summary table.
pub const SUMMARY_FILE: &str = "summary_report.csv";

/// Header of the label column.
const LABEL_COLUMN: &str = "anomaly";

/// Paths written by [`export_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub observations: PathBuf,
    pub summary: PathBuf,
}

/// Writer for the two CSV outputs.
pub struct CsvExporter;

/// Reader for the two CSV outputs.
pub struct CsvImporter;

#[derive(Serialize)]
struct ObservationRow {
    timestamp: String,
    temperature: f64,
    humidity: f64,
    light: f64,
    anomaly: Label,
}

/// Header row of the observation table. The index column is unnamed.
fn observation_header() -> Vec<&'static str> {
    let mut header = vec![""];
    header.extend(Signal::ALL.iter().map(|s| s.column_name()));
    header.push(LABEL_COLUMN);
    header
}

/// Create the output directory if it is missing. No-op when it exists.
pub fn ensure_output_dir(dir: &Path) -> EnvResult<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Write both CSV files into `dir`, creating it first.
pub fn export_all(dir: &Path, series: &LabeledSeries, summary: &Summary) -> EnvResult<ExportedFiles> {
    ensure_output_dir(dir)?;

    let files = ExportedFiles {
        observations: dir.join(OBSERVATIONS_FILE),
        summary: dir.join(SUMMARY_FILE),
    };
    CsvExporter::write_observations_to_file(series, &files.observations)?;
    CsvExporter::write_summary_to_file(summary, &files.summary)?;
    Ok(files)
}

impl CsvExporter {
    /// Write the labelled table to a file.
    pub fn write_observations_to_file(series: &LabeledSeries, path: &Path) -> EnvResult<()> {
        let mut file = std::fs::File::create(path)?;
        Self::write_observations(series, &mut file)?;
        tracing::info!("Wrote {} rows to {}", series.len(), path.display());
        Ok(())
    }

    /// Write the labelled table to any writer, timestamp index first.
    pub fn write_observations<W: Write>(series: &LabeledSeries, writer: &mut W) -> EnvResult<()> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv.write_record(observation_header())?;
        for (obs, label) in series.iter() {
            csv.serialize(ObservationRow {
                timestamp: obs.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                temperature: obs.temperature,
                humidity: obs.humidity,
                light: obs.light,
                anomaly: label,
            })?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the summary to a file.
    pub fn write_summary_to_file(summary: &Summary, path: &Path) -> EnvResult<()> {
        let mut file = std::fs::File::create(path)?;
        Self::write_summary(summary, &mut file)?;
        tracing::info!("Wrote summary to {}", path.display());
        Ok(())
    }

    /// Write the summary as a header plus one row, without an index column.
    pub fn write_summary<W: Write>(summary: &Summary, writer: &mut W) -> EnvResult<()> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv.write_record(SUMMARY_COLUMNS)?;
        csv.serialize(summary)?;
        csv.flush()?;
        Ok(())
    }
}

impl CsvImporter {
    /// Read a labelled table from a file.
    pub fn read_observations_from_file(path: &Path) -> EnvResult<LabeledSeries> {
        let mut file = std::fs::File::open(path)?;
        Self::read_observations(&mut file)
    }

    /// Read a labelled table written by [`CsvExporter::write_observations`].
    pub fn read_observations<R: Read>(reader: &mut R) -> EnvResult<LabeledSeries> {
        let mut csv = csv::Reader::from_reader(reader);
        check_header(csv.headers()?, &observation_header())?;

        let mut observations = Vec::new();
        let mut labels = Vec::new();
        for record in csv.deserialize::<(String, f64, f64, f64, i8)>() {
            let (ts, temperature, humidity, light, code) = record?;
            let timestamp = NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT)
                .map_err(|e| EnvError::Parse(format!("Invalid timestamp {ts:?}: {e}")))?;
            let label = Label::from_i8(code)
                .ok_or_else(|| EnvError::Parse(format!("Invalid label {code}")))?;
            observations.push(Observation {
                timestamp,
                temperature,
                humidity,
                light,
            });
            labels.push(label);
        }
        LabeledSeries::new(observations, labels)
    }

    /// Read a summary from a file.
    pub fn read_summary_from_file(path: &Path) -> EnvResult<Summary> {
        let mut file = std::fs::File::open(path)?;
        Self::read_summary(&mut file)
    }

    /// Read a summary written by [`CsvExporter::write_summary`]. Exactly one row.
    pub fn read_summary<R: Read>(reader: &mut R) -> EnvResult<Summary> {
        let mut csv = csv::Reader::from_reader(reader);
        check_header(csv.headers()?, &SUMMARY_COLUMNS)?;

        let rows = csv
            .deserialize::<(f64, f64, f64, usize)>()
            .collect::<Result<Vec<_>, _>>()?;
        match rows.as_slice() {
            [(avg_temperature, avg_humidity, avg_light, total_anomalies)] => Ok(Summary {
                avg_temperature: *avg_temperature,
                avg_humidity: *avg_humidity,
                avg_light: *avg_light,
                total_anomalies: *total_anomalies,
            }),
            _ => Err(EnvError::Parse(format!(
                "Expected exactly one summary row, found {}",
                rows.len()
            ))),
        }
    }
}

fn check_header(found: &csv::StringRecord, expected: &[&str]) -> EnvResult<()> {
    if found.iter().ne(expected.iter().copied()) {
        return Err(EnvError::Parse(format!(
            "Unexpected header: expected {expected:?}, got {:?}",
            found.iter().collect::<Vec<_>>()
        )));
    }
    Ok(())
}
