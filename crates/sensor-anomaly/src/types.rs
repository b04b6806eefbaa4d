//! Core data types for sensor observations, labels and summaries.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Timestamp format used for display and CSV export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One hourly reading of the three environmental signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
}

impl Observation {
    /// Value of a single signal.
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Temperature => self.temperature,
            Signal::Humidity => self.humidity,
            Signal::Light => self.light,
        }
    }

    /// Mutable access to a single signal.
    pub fn get_mut(&mut self, signal: Signal) -> &mut f64 {
        match signal {
            Signal::Temperature => &mut self.temperature,
            Signal::Humidity => &mut self.humidity,
            Signal::Light => &mut self.light,
        }
    }

    /// The three signals as a feature row, in column order.
    pub fn features(&self) -> Vec<f64> {
        Signal::ALL.iter().map(|s| self.get(*s)).collect()
    }
}

/// One of the three measured signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Temperature,
    Humidity,
    Light,
}

impl Signal {
    /// All signals in column order.
    pub const ALL: [Signal; 3] = [Signal::Temperature, Signal::Humidity, Signal::Light];

    /// Column header used in the exported table.
    pub fn column_name(self) -> &'static str {
        match self {
            Signal::Temperature => "Temperature (°C)",
            Signal::Humidity => "Humidity (%)",
            Signal::Light => "Light (lux)",
        }
    }
}

/// Outcome of scoring one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Normal,
    Anomalous,
}

impl Label {
    /// Conventional outlier encoding: `1` for inliers, `-1` for outliers.
    pub fn as_i8(self) -> i8 {
        match self {
            Label::Normal => 1,
            Label::Anomalous => -1,
        }
    }

    /// Inverse of [`Label::as_i8`].
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Label::Normal),
            -1 => Some(Label::Anomalous),
            _ => None,
        }
    }

    pub fn is_anomalous(self) -> bool {
        self == Label::Anomalous
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// Time-indexed table produced by the generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSeries {
    pub observations: Vec<Observation>,
}

impl SensorSeries {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Feature matrix, one row per observation.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.observations.iter().map(Observation::features).collect()
    }

    /// Attach one label per observation.
    pub fn with_labels(self, labels: Vec<Label>) -> EnvResult<LabeledSeries> {
        LabeledSeries::new(self.observations, labels)
    }
}

/// Observations with the label column appended.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    observations: Vec<Observation>,
    labels: Vec<Label>,
}

impl LabeledSeries {
    /// Pair observations with labels. Lengths must match.
    pub fn new(observations: Vec<Observation>, labels: Vec<Label>) -> EnvResult<Self> {
        if observations.len() != labels.len() {
            return Err(EnvError::InvalidInput(format!(
                "{} labels for {} observations",
                labels.len(),
                observations.len()
            )));
        }
        Ok(Self {
            observations,
            labels,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Iterate rows as `(observation, label)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (&Observation, Label)> + '_ {
        self.observations.iter().zip(self.labels.iter().copied())
    }

    /// Number of rows labelled anomalous.
    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomalous()).count()
    }

    /// Rows labelled anomalous, in time order.
    pub fn anomalies(&self) -> Vec<&Observation> {
        self.iter()
            .filter(|(_, label)| label.is_anomalous())
            .map(|(obs, _)| obs)
            .collect()
    }

    /// `(timestamp, temperature)` for every row.
    pub fn temperature_points(&self) -> Vec<(NaiveDateTime, f64)> {
        self.observations
            .iter()
            .map(|o| (o.timestamp, o.temperature))
            .collect()
    }
}

/// Single-row aggregate of a labelled series. Fields serialize in column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_light: f64,
    pub total_anomalies: usize,
}

/// Errors that can occur in the sensor-anomaly library.
#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience result type.
pub type EnvResult<T> = Result<T, EnvError>;
