//! Per-signal means and anomaly count.

use std::fmt;

use crate::types::{LabeledSeries, Signal, Summary};

/// Column headers of the summary table, in order.
pub const SUMMARY_COLUMNS: [&str; 4] = [
    "Average Temperature (°C)",
    "Average Humidity (%)",
    "Average Light (lux)",
    "Total Anomalies",
];

impl Summary {
    /// Aggregate a labelled series. An empty series yields zero means.
    pub fn from_series(series: &LabeledSeries) -> Self {
        let column_mean = |signal: Signal| {
            let values: Vec<f64> = series.observations().iter().map(|o| o.get(signal)).collect();
            mean(&values)
        };

        Self {
            avg_temperature: column_mean(Signal::Temperature),
            avg_humidity: column_mean(Signal::Humidity),
            avg_light: column_mean(Signal::Light),
            total_anomalies: series.anomaly_count(),
        }
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return 0.0;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Six decimals with trailing zeros dropped, keeping at least one.
fn format_float(v: f64) -> String {
    let text = format!("{v:.6}");
    match text.find('.') {
        Some(dot) => {
            let trimmed = text.trim_end_matches('0');
            if trimmed.len() == dot + 1 {
                format!("{trimmed}0")
            } else {
                trimmed.to_string()
            }
        }
        None => text,
    }
}

/// Renders as a one-row table with a leading `0` row index.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = [
            format_float(self.avg_temperature),
            format_float(self.avg_humidity),
            format_float(self.avg_light),
            self.total_anomalies.to_string(),
        ];

        let mut header = String::from(" ");
        let mut row = String::from("0");
        for (name, value) in SUMMARY_COLUMNS.iter().zip(values.iter()) {
            let width = name.chars().count().max(value.len());
            header.push_str(&format!("  {name:>width$}"));
            row.push_str(&format!("  {value:>width$}"));
        }
        writeln!(f, "{header}")?;
        write!(f, "{row}")
    }
}
