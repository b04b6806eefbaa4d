//! Isolation forest outlier scoring.
//!
//! Each tree isolates points with random axis-aligned splits; points that
//! separate from the bulk after few splits get short path lengths and low
//! scores. The decision threshold is calibrated from the training scores so
//! that roughly the configured contamination fraction falls below it.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{EnvError, EnvResult, Label, LabeledSeries, SensorSeries};

/// Euler–Mascheroni constant, used to approximate harmonic numbers.
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Upper bound on the per-tree subsample when `MaxSamples::Auto` is used.
const AUTO_MAX_SAMPLES: usize = 256;

/// Threshold used when contamination is `Auto`.
const AUTO_OFFSET: f64 = -0.5;

/// Seed for the model's internal randomness.
pub const DEFAULT_MODEL_SEED: u64 = 42;

/// Expected share of outliers in the training data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contamination {
    /// Fixed `-0.5` score threshold.
    Auto,
    /// Fraction in `(0, 0.5]`.
    Fraction(f64),
}

/// Rows drawn per tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxSamples {
    /// `min(256, n)`.
    Auto,
    /// At most this many rows, capped at `n`.
    Count(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_samples: MaxSamples,
    pub contamination: Contamination,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: MaxSamples::Auto,
            contamination: Contamination::Fraction(0.1),
            seed: DEFAULT_MODEL_SEED,
        }
    }
}

impl ForestConfig {
    /// Default config with a different model seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn validate(&self) -> EnvResult<()> {
        if self.n_estimators == 0 {
            return Err(EnvError::InvalidInput("n_estimators must be at least 1".into()));
        }
        if self.max_samples == MaxSamples::Count(0) {
            return Err(EnvError::InvalidInput("max_samples must be at least 1".into()));
        }
        if let Contamination::Fraction(f) = self.contamination {
            if !(f > 0.0 && f <= 0.5) {
                return Err(EnvError::InvalidInput(format!(
                    "contamination must be in (0, 0.5], got {f}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One isolation tree, stored as a flat arena rooted at index 0.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build<R: Rng>(data: &[Vec<f64>], rows: Vec<usize>, height_limit: usize, rng: &mut R) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, rows, 0, height_limit, rng);
        tree
    }

    /// Grow the subtree for `rows` and return its node index.
    fn grow<R: Rng>(
        &mut self,
        data: &[Vec<f64>],
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut R,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if rows.len() <= 1 || depth >= height_limit {
            return idx;
        }

        // (feature, min, max) for every feature that still varies on this node
        let width = data[rows[0]].len();
        let candidates: Vec<(usize, f64, f64)> = (0..width)
            .filter_map(|f| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    (lo.min(data[r][f]), hi.max(data[r][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();

        if candidates.is_empty() {
            return idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[r][feature] <= threshold);

        let left = self.grow(data, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(data, right_rows, depth + 1, height_limit, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    /// Depth of the leaf reached by `point`, adjusted for unsplit leaf size.
    fn path_length(&self, point: &[f64]) -> f64 {
        let mut idx = 0;
        let mut depth = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if point[*feature] <= *threshold { *left } else { *right };
                    depth += 1;
                }
            }
        }
    }
}

/// Fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit the forest on a rectangular matrix of finite values.
    pub fn fit(config: &ForestConfig, data: &[Vec<f64>]) -> EnvResult<Self> {
        config.validate()?;
        let n_features = validate_matrix(data)?;

        let n = data.len();
        let sample_size = match config.max_samples {
            MaxSamples::Auto => n.min(AUTO_MAX_SAMPLES),
            MaxSamples::Count(k) => n.min(k),
        };
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let trees = (0..config.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(data, rows, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            n_features,
            offset: AUTO_OFFSET,
        };

        if let Contamination::Fraction(f) = config.contamination {
            let scores = forest.raw_scores(data);
            forest.offset = percentile(&scores, 100.0 * f);
        }

        tracing::debug!(
            "Fitted {} trees on {} rows (sample size {}, height limit {}), offset {:.6}",
            config.n_estimators,
            n,
            sample_size,
            height_limit,
            forest.offset
        );
        Ok(forest)
    }

    /// Score threshold; rows scoring below it are anomalous.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Opposite of the anomaly score: values near `-1` are outliers,
    /// values near `-0.5` or above are inliers.
    pub fn score_samples(&self, data: &[Vec<f64>]) -> EnvResult<Vec<f64>> {
        self.check_width(data)?;
        Ok(self.raw_scores(data))
    }

    /// `score_samples - offset`; negative means anomalous.
    pub fn decision_function(&self, data: &[Vec<f64>]) -> EnvResult<Vec<f64>> {
        Ok(self
            .score_samples(data)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    /// Label each row.
    pub fn predict(&self, data: &[Vec<f64>]) -> EnvResult<Vec<Label>> {
        Ok(self
            .decision_function(data)?
            .into_iter()
            .map(|d| if d < 0.0 { Label::Anomalous } else { Label::Normal })
            .collect())
    }

    fn raw_scores(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size).max(f64::MIN_POSITIVE);
        let trees = self.trees.len() as f64;
        data.iter()
            .map(|point| {
                let mean_depth =
                    self.trees.iter().map(|t| t.path_length(point)).sum::<f64>() / trees;
                -(2f64).powf(-mean_depth / norm)
            })
            .collect()
    }

    fn check_width(&self, data: &[Vec<f64>]) -> EnvResult<()> {
        let width = validate_matrix(data)?;
        if width != self.n_features {
            return Err(EnvError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features, width
            )));
        }
        Ok(())
    }
}

/// Fit a forest on the series' three signals and append the labels.
pub fn label_series(series: SensorSeries, config: &ForestConfig) -> EnvResult<LabeledSeries> {
    let features = series.feature_matrix();
    let forest = IsolationForest::fit(config, &features)?;
    let labels = forest.predict(&features)?;
    let labeled = series.with_labels(labels)?;
    tracing::info!(
        "Labelled {} of {} rows anomalous (contamination {:?}, seed {})",
        labeled.anomaly_count(),
        labeled.len(),
        config.contamination,
        config.seed
    );
    Ok(labeled)
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in `[0, 100]`.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Check the matrix is non-empty, rectangular and finite; return its width.
fn validate_matrix(data: &[Vec<f64>]) -> EnvResult<usize> {
    let width = match data.first() {
        Some(row) => row.len(),
        None => return Err(EnvError::InvalidInput("feature matrix is empty".into())),
    };
    if width == 0 {
        return Err(EnvError::InvalidInput("feature rows have no columns".into()));
    }
    for (i, row) in data.iter().enumerate() {
        if row.len() != width {
            return Err(EnvError::InvalidInput(format!(
                "row {i} has {} columns, expected {width}",
                row.len()
            )));
        }
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(EnvError::InvalidInput(format!(
                "non-finite value at row {i}, column {j}"
            )));
        }
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_distr::{Distribution, StandardNormal};

    /// Gaussian cluster of `n` 2-D points around the origin.
    fn cluster(n: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let x: f64 = StandardNormal.sample(&mut rng);
                let y: f64 = StandardNormal.sample(&mut rng);
                vec![x, y]
            })
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // 2 * (ln 255 + gamma) - 2 * 255 / 256
        let c256 = average_path_length(256);
        assert!((c256 - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = vec![4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 100.0), 5.0);
        assert_eq!(percentile(&v, 50.0), 3.0);
        assert!((percentile(&v, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_isolates_far_point() {
        let mut data = cluster(200, 7);
        data.push(vec![12.0, -12.0]);

        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        let scores = forest.score_samples(&data).unwrap();
        let outlier = *scores.last().unwrap();
        assert!(scores[..200].iter().all(|&s| s > outlier));

        let labels = forest.predict(&data).unwrap();
        assert_eq!(*labels.last().unwrap(), Label::Anomalous);
    }

    #[test]
    fn test_scores_are_in_range() {
        let data = cluster(100, 3);
        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        for s in forest.score_samples(&data).unwrap() {
            assert!((-1.0..=0.0).contains(&s));
        }
    }

    #[test]
    fn test_contamination_controls_count() {
        let data = cluster(300, 11);
        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        let count = forest
            .predict(&data)
            .unwrap()
            .iter()
            .filter(|l| l.is_anomalous())
            .count();
        assert!((25..=30).contains(&count), "got {count}");
    }

    #[test]
    fn test_same_seed_same_model() {
        let data = cluster(150, 5);
        let a = IsolationForest::fit(&ForestConfig::with_seed(9), &data).unwrap();
        let b = IsolationForest::fit(&ForestConfig::with_seed(9), &data).unwrap();
        assert_eq!(a.score_samples(&data).unwrap(), b.score_samples(&data).unwrap());
        assert_eq!(a.offset(), b.offset());
    }

    #[test]
    fn test_auto_contamination_uses_fixed_offset() {
        let data = cluster(50, 1);
        let config = ForestConfig {
            contamination: Contamination::Auto,
            ..ForestConfig::default()
        };
        let forest = IsolationForest::fit(&config, &data).unwrap();
        assert_eq!(forest.offset(), -0.5);
    }

    #[test]
    fn test_constant_data_is_all_normal() {
        let data = vec![vec![1.0, 2.0, 3.0]; 20];
        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        let labels = forest.predict(&data).unwrap();
        assert!(labels.iter().all(|l| *l == Label::Normal));
    }

    #[test]
    fn test_single_row() {
        let data = vec![vec![1.0, 2.0]];
        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        assert_eq!(forest.predict(&data).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut data = cluster(10, 2);
        data[4][1] = f64::NAN;
        let err = IsolationForest::fit(&ForestConfig::default(), &data).unwrap_err();
        assert!(err.to_string().contains("row 4, column 1"));
    }

    #[test]
    fn test_rejects_ragged_and_empty() {
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(IsolationForest::fit(&ForestConfig::default(), &ragged).is_err());
        assert!(IsolationForest::fit(&ForestConfig::default(), &[]).is_err());
        assert!(IsolationForest::fit(&ForestConfig::default(), &[vec![]]).is_err());
    }

    #[test]
    fn test_rejects_bad_config() {
        let data = cluster(10, 2);
        for contamination in [0.0, 0.6, -0.1, f64::NAN] {
            let config = ForestConfig {
                contamination: Contamination::Fraction(contamination),
                ..ForestConfig::default()
            };
            assert!(IsolationForest::fit(&config, &data).is_err());
        }
        let config = ForestConfig {
            n_estimators: 0,
            ..ForestConfig::default()
        };
        assert!(IsolationForest::fit(&config, &data).is_err());
    }

    #[test]
    fn test_predict_checks_width() {
        let data = cluster(20, 4);
        let forest = IsolationForest::fit(&ForestConfig::default(), &data).unwrap();
        assert!(forest.predict(&[vec![1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn test_value_on_split_goes_left() {
        let tree = IsolationTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { size: 1 },
                Node::Leaf { size: 2 },
            ],
        };
        assert_eq!(tree.path_length(&[1.0]), 1.0);
        assert_eq!(tree.path_length(&[0.5]), 1.0);
        assert_eq!(tree.path_length(&[1.5]), 2.0);
    }
}
