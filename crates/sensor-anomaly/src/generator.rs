//! Synthetic hourly environmental series with injected anomalies.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::types::{EnvError, EnvResult, Observation, SensorSeries, Signal};

/// Seven days of hourly readings.
pub const DEFAULT_PERIODS: usize = 24 * 7;

/// Seed for the signal noise stream.
pub const DEFAULT_NOISE_SEED: u64 = 2025;

/// A fixed single-cell override applied after generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyInjection {
    pub offset: usize,
    pub signal: Signal,
    pub delta: f64,
}

impl AnomalyInjection {
    pub fn new(offset: usize, signal: Signal, delta: f64) -> Self {
        Self {
            offset,
            signal,
            delta,
        }
    }
}

/// Parameters for the synthetic series.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub start: NaiveDateTime,
    pub periods: usize,
    pub step: Duration,
    pub seed: u64,
    pub injections: Vec<AnomalyInjection>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            periods: DEFAULT_PERIODS,
            step: Duration::hours(1),
            seed: DEFAULT_NOISE_SEED,
            injections: default_injections(),
        }
    }
}

impl GeneratorConfig {
    /// Default config with a different noise seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Spike in temperature, drop in humidity, spike in light.
pub fn default_injections() -> Vec<AnomalyInjection> {
    vec![
        AnomalyInjection::new(50, Signal::Temperature, 15.0),
        AnomalyInjection::new(120, Signal::Humidity, -30.0),
        AnomalyInjection::new(140, Signal::Light, 1000.0),
    ]
}

fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Generate the series and apply the configured injections.
///
/// Noise is drawn from one seeded stream in column order: all temperature
/// draws, then humidity, then light.
pub fn generate(config: &GeneratorConfig) -> EnvResult<SensorSeries> {
    let n = config.periods;
    if n == 0 {
        return Err(EnvError::InvalidInput("periods must be at least 1".into()));
    }
    if config.step <= Duration::zero() {
        return Err(EnvError::InvalidInput("step must be positive".into()));
    }
    for inj in &config.injections {
        if inj.offset >= n {
            return Err(EnvError::InvalidInput(format!(
                "injection offset {} out of range for {} periods",
                inj.offset, n
            )));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut noise = |scale: f64| -> Vec<f64> {
        (0..n)
            .map(|_| {
                let z: f64 = StandardNormal.sample(&mut rng);
                z * scale
            })
            .collect()
    };
    let temp_noise = noise(1.0);
    let humidity_noise = noise(10.0);
    let light_noise = noise(20.0);

    let slow = linspace(0.0, 3.0 * PI, n);
    let fast = linspace(0.0, 6.0 * PI, n);

    let mut observations = Vec::with_capacity(n);
    let mut timestamp = config.start;
    for i in 0..n {
        observations.push(Observation {
            timestamp,
            temperature: 20.0 + 5.0 * slow[i].sin() + temp_noise[i],
            humidity: 60.0 + humidity_noise[i],
            light: (500.0 * fast[i].sin()).abs() + light_noise[i],
        });
        timestamp += config.step;
    }

    for inj in &config.injections {
        *observations[inj.offset].get_mut(inj.signal) += inj.delta;
        tracing::debug!(
            "Injected {:+} into {} at row {}",
            inj.delta,
            inj.signal.column_name(),
            inj.offset
        );
    }

    tracing::info!(
        "Generated {} observations starting {} (seed {})",
        n,
        config.start,
        config.seed
    );
    Ok(SensorSeries::new(observations))
}

/// `n` evenly spaced points over `[start, end]`, both ends included.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
