//! Temperature chart with anomalous rows highlighted, rendered in memory.

use std::ops::Range;
use std::path::Path;

use chrono::NaiveDateTime;
use image::RgbImage;
use plotters::prelude::*;

use crate::types::{EnvError, EnvResult, LabeledSeries};

const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// Marker radius for anomalous points, in pixels.
const MARKER_SIZE: u32 = 4;

/// Size and title of the rendered chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 400,
            title: "Temperature with Detected Anomalies".to_string(),
        }
    }
}

/// Render temperature over time as a line, with anomalous rows as markers.
///
/// The x axis is hours since the first observation; tick labels show the
/// wall-clock time.
pub fn render_temperature_chart(series: &LabeledSeries, options: &ChartOptions) -> EnvResult<RgbImage> {
    let start = match series.observations().first() {
        Some(obs) => obs.timestamp,
        None => return Err(EnvError::InvalidInput("cannot chart an empty series".into())),
    };
    let (w, h) = (options.width, options.height);
    if w == 0 || h == 0 {
        return Err(EnvError::InvalidInput(format!("invalid chart size {w}x{h}")));
    }

    let line: Vec<(f64, f64)> = series
        .temperature_points()
        .into_iter()
        .map(|(t, v)| (hours_since(start, t), v))
        .collect();
    let markers: Vec<(f64, f64)> = series
        .anomalies()
        .into_iter()
        .map(|o| (hours_since(start, o.timestamp), o.temperature))
        .collect();
    let (x_range, y_range) = axis_ranges(&line);

    let mut buf = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Time")
            .y_desc("Temperature (°C)")
            .x_label_formatter(&|x: &f64| format_tick(start, *x))
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(line, ORANGE.stroke_width(2)))
            .map_err(chart_err)?
            .label("Temperature")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(2)));

        chart
            .draw_series(
                markers
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), MARKER_SIZE, BLUE.filled())),
            )
            .map_err(chart_err)?
            .label("Anomalies")
            .legend(|(x, y)| Circle::new((x + 10, y), MARKER_SIZE, BLUE.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    tracing::debug!("Rendered {}x{} chart with {} markers", w, h, markers.len());
    RgbImage::from_raw(w, h, buf)
        .ok_or_else(|| EnvError::Chart("pixel buffer does not match chart size".into()))
}

/// Write a rendered chart to disk; the format follows the file extension.
pub fn save_chart(chart: &RgbImage, path: &Path) -> EnvResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    chart.save(path)?;
    tracing::info!("Saved chart to {}", path.display());
    Ok(())
}

fn chart_err<E: std::fmt::Display>(e: E) -> EnvError {
    EnvError::Chart(e.to_string())
}

fn hours_since(start: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - start).num_seconds() as f64 / 3600.0
}

fn format_tick(start: NaiveDateTime, hours: f64) -> String {
    let t = start + chrono::Duration::seconds((hours * 3600.0).round() as i64);
    t.format("%m-%d %H:%M").to_string()
}

/// Axis ranges covering every point, with vertical padding.
fn axis_ranges(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max).max(1.0);
    let (y_min, y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if !y_min.is_finite() || !y_max.is_finite() {
        return (0.0..x_max, 0.0..1.0);
    }
    let pad = ((y_max - y_min) * 0.05).max(1.0);
    (0.0..x_max, (y_min - pad)..(y_max + pad))
}
