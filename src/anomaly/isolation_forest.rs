//! Isolation Forest outlier detector.
//!
//! Each tree is grown on a random sub-sample (without replacement) by
//! picking a random non-constant feature and a uniform split value between
//! that feature's min and max, until a node holds one sample or the height
//! limit `ceil(log2(max_samples))` is reached. Anomalies isolate in fewer
//! splits, so a short average path means a high anomaly score.
//!
//! Scores follow the usual convention: `score_samples` is the negated
//! anomaly score (lower is more abnormal), `decision_function` shifts it by
//! the offset fitted from the contamination ratio, and `predict` maps a
//! negative decision to `-1` (anomaly) and the rest to `1` (normal).
//!
//! Trees are stored as flat node arenas so the fitted forest serializes
//! directly to JSON.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AnomalyError;
use crate::config::TrainingConfig;

/// Euler–Mascheroni constant.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Upper bound on the per-tree sub-sample; capped at the row count.
    pub max_samples: usize,
    /// Expected share of anomalies, used to place the decision offset.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for ForestParams {
    fn from(cfg: &TrainingConfig) -> Self {
        Self {
            n_estimators: cfg.n_estimators,
            max_samples: cfg.max_samples,
            contamination: cfg.contamination,
            seed: cfg.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &[Vec<f64>], sample: &mut [usize], height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(data, sample, 0, height_limit, rng);
        tree
    }

    fn grow_node(
        &mut self,
        data: &[Vec<f64>],
        indices: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= height_limit || indices.len() <= 1 {
            return id;
        }

        // Only features that still vary inside this node can split it
        let n_features = data[indices[0]].len();
        let candidates: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(data[i][f]), hi.max(data[i][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);

        let mut mid = 0;
        for j in 0..indices.len() {
            if data[indices[j]][feature] < threshold {
                indices.swap(mid, j);
                mid += 1;
            }
        }

        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.grow_node(data, left_idx, depth + 1, height_limit, rng);
        let right = self.grow_node(data, right_idx, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Edges from the root to the leaf holding `x`, plus the expected
    /// remaining depth of the unbuilt subtree below that leaf.
    fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree
/// of `n` nodes, used to normalise path lengths.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in `[0, 1]`.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// A fitted isolation forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    params: ForestParams,
    /// Sub-sample size actually used per tree.
    sample_size: usize,
    n_features: usize,
    /// Subtracted from `score_samples` by `decision_function`.
    offset: f64,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit on already scaled rows.
    pub fn fit(data: &[Vec<f64>], params: ForestParams) -> Result<Self, AnomalyError> {
        let n = data.len();
        if n == 0 {
            return Err(AnomalyError::EmptyTrainingSet);
        }
        let n_features = data[0].len();
        if let Some(bad) = data.iter().find(|r| r.len() != n_features) {
            return Err(AnomalyError::DimensionMismatch {
                expected: n_features,
                found: bad.len(),
            });
        }
        if params.n_estimators == 0 || params.max_samples == 0 {
            return Err(AnomalyError::InvalidParams(
                "n_estimators and max_samples must be > 0".to_string(),
            ));
        }
        if !(params.contamination > 0.0 && params.contamination <= 0.5) {
            return Err(AnomalyError::InvalidParams(format!(
                "contamination ({}) must be in (0, 0.5]",
                params.contamination
            )));
        }

        let sample_size = params.max_samples.min(n);
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_estimators)
            .map(|_| {
                let mut sample = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(data, &mut sample, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            params,
            sample_size,
            n_features,
            offset: 0.0,
            trees,
        };

        let scores = forest.score_samples(data)?;
        forest.offset = percentile(&scores, params.contamination);
        debug!(
            trees = forest.trees.len(),
            sample_size,
            offset = forest.offset,
            "Isolation forest fitted"
        );
        Ok(forest)
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn check_row(&self, row: &[f64]) -> Result<(), AnomalyError> {
        if row.len() == self.n_features {
            Ok(())
        } else {
            Err(AnomalyError::DimensionMismatch {
                expected: self.n_features,
                found: row.len(),
            })
        }
    }

    /// Negated anomaly score of one row, in `[-1, 0]`.
    pub fn score_row(&self, row: &[f64]) -> Result<f64, AnomalyError> {
        self.check_row(row)?;
        let mean_path =
            self.trees.iter().map(|t| t.path_length(row)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size).max(f64::EPSILON);
        Ok(-(2f64.powf(-mean_path / norm)))
    }

    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, AnomalyError> {
        data.iter().map(|r| self.score_row(r)).collect()
    }

    pub fn decision_function(&self, data: &[Vec<f64>]) -> Result<Vec<f64>, AnomalyError> {
        Ok(self
            .score_samples(data)?
            .into_iter()
            .map(|s| s - self.offset)
            .collect())
    }

    /// `-1` for anomalies, `1` for normal rows.
    pub fn predict(&self, data: &[Vec<f64>]) -> Result<Vec<i8>, AnomalyError> {
        Ok(self
            .decision_function(data)?
            .into_iter()
            .map(|d| if d < 0.0 { -1 } else { 1 })
            .collect())
    }
}
