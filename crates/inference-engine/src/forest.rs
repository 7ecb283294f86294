//! Isolation Forest
//!
//! Random partitioning trees: anomalies sit in sparse regions and are
//! isolated after fewer splits, so a short mean path length means an outlier.
//! Scores follow the usual convention of `-2^(-E[h(x)] / c(n))`, which lies
//! in `[-1, 0)` with more negative values being more anomalous.

use crate::InferenceError;
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the training set size)
    pub max_samples: usize,
    /// Expected share of outliers in the training set
    pub contamination: f64,
    /// Seed for subsampling and split selection
    pub random_seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.15,
            random_seed: 42,
        }
    }
}

impl ForestConfig {
    /// Check hyperparameters before fitting
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.n_estimators == 0 {
            return Err(InferenceError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(InferenceError::InvalidConfig(
                "max_samples must be at least 2".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(InferenceError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// Average path length of an unsuccessful BST search over `n` points
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree, stored as a flat node list with the root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(data: &[FeatureVector], indices: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, indices, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        data: &[FeatureVector],
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { size: indices.len() });

        if depth >= max_depth || indices.len() <= 1 {
            return slot;
        }

        // Only features that still vary inside this node can split it
        let mut candidates = Vec::with_capacity(FEATURE_DIMENSION);
        for feature in 0..FEATURE_DIMENSION {
            let (lo, hi) = indices.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &i| {
                let v = data[i].values[feature];
                (lo.min(v), hi.max(v))
            });
            if lo < hi {
                candidates.push((feature, lo, hi));
            }
        }
        if candidates.is_empty() {
            return slot;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);

        // Partition in place: values <= threshold first
        let mut split = 0;
        for i in 0..indices.len() {
            if data[indices[i]].values[feature] <= threshold {
                indices.swap(i, split);
                split += 1;
            }
        }

        let (left_indices, right_indices) = indices.split_at_mut(split);
        let left = self.grow(data, left_indices, depth + 1, max_depth, rng);
        let right = self.grow(data, right_indices, depth + 1, max_depth, rng);

        self.nodes[slot] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        slot
    }

    /// Depth of the leaf reached by `x`, adjusted for the points left in it
    pub fn path_length(&self, x: &FeatureVector) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x.values[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Fitted Isolation Forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    config: ForestConfig,
    /// Subsample size each tree was grown on
    sample_size: usize,
    /// Score below which a point is an outlier
    offset: f64,
    trees: Vec<IsolationTree>,
}

impl IsolationForest {
    /// Fit the forest on (already standardized) samples
    pub fn fit(samples: &[FeatureVector], config: ForestConfig) -> Result<Self, InferenceError> {
        config.validate()?;
        if samples.len() < 2 {
            return Err(InferenceError::InsufficientSamples {
                required: 2,
                actual: samples.len(),
            });
        }

        let sample_size = config.max_samples.min(samples.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.random_seed);

        let trees = (0..config.n_estimators)
            .map(|_| {
                let mut indices =
                    rand::seq::index::sample(&mut rng, samples.len(), sample_size).into_vec();
                IsolationTree::fit(samples, &mut indices, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            config,
            sample_size,
            offset: -0.5,
            trees,
        };

        let training_scores: Vec<f64> = samples.iter().map(|s| forest.score_sample(s)).collect();
        forest.offset = percentile(&training_scores, 100.0 * forest.config.contamination);

        debug!(
            trees = forest.trees.len(),
            sample_size,
            max_depth,
            offset = forest.offset,
            "Fitted isolation forest"
        );

        Ok(forest)
    }

    /// Continuous outlier score in `[-1, 0)`; more negative = more anomalous
    pub fn score_sample(&self, x: &FeatureVector) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>()
            / self.trees.len() as f64;
        -(2f64.powf(-mean_path / average_path_length(self.sample_size)))
    }

    /// Score shifted by the contamination offset; negative means outlier
    pub fn decision_function(&self, x: &FeatureVector) -> f64 {
        self.score_sample(x) - self.offset
    }

    /// Whether `x` is labelled an outlier
    pub fn predict(&self, x: &FeatureVector) -> bool {
        self.decision_function(x) < 0.0
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * (q / 100.0);
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}
