//! Isolation forest outlier model
//!
//! Points that need few random axis-aligned splits to be separated from the
//! rest of the batch receive high anomaly scores. Trees are grown on random
//! subsamples from a seeded `ChaCha8Rng`, so fitting is reproducible.

use super::{contamination_threshold, AnomalyClassifier};
use crate::config::ClassifierConfig;
use crate::error::ControllerError;
use crate::models::{Features, Label, FEATURE_COUNT};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::debug;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Randomized partitioning ensemble
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    trees: Vec<IsolationTree>,
    subsample_size: usize,
    threshold: Option<f64>,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, max_samples: usize, contamination: f64, seed: u64) -> Self {
        Self {
            n_estimators,
            max_samples,
            contamination,
            seed,
            trees: Vec::new(),
            subsample_size: 0,
            threshold: None,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(
            config.n_estimators,
            config.max_samples,
            config.contamination,
            config.seed,
        )
    }

    /// Anomaly score in `(0, 1]`; values near 1 are easy to isolate
    pub fn score(&self, features: &Features) -> Result<f64, ControllerError> {
        if self.trees.is_empty() {
            return Err(ControllerError::ClassifierNotFitted);
        }

        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(features))
            .sum();
        let mean_path = total / self.trees.len() as f64;

        // c(1) is zero; a one-point subsample has no meaningful depth
        let normalizer = average_path_length(self.subsample_size).max(1.0);
        Ok(2f64.powf(-mean_path / normalizer))
    }

    /// Decision threshold learned from the training scores
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }
}

impl AnomalyClassifier for IsolationForest {
    fn name(&self) -> &'static str {
        "isolation_forest"
    }

    fn fit(&mut self, features: &[Features]) -> Result<(), ControllerError> {
        if features.is_empty() {
            self.trees.clear();
            self.threshold = None;
            return Ok(());
        }

        let start = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let subsample_size = self.max_samples.min(features.len());
        let height_limit = (subsample_size as f64).log2().ceil().max(0.0) as usize;

        self.subsample_size = subsample_size;
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let subsample: Vec<Features> = index::sample(&mut rng, features.len(), subsample_size)
                    .into_iter()
                    .map(|i| features[i])
                    .collect();
                IsolationTree::grow(subsample, height_limit, &mut rng)
            })
            .collect();

        let scores = features
            .iter()
            .map(|f| self.score(f))
            .collect::<Result<Vec<_>, _>>()?;
        let threshold = contamination_threshold(scores, self.contamination);
        self.threshold = Some(threshold);

        debug!(
            trees = self.trees.len(),
            subsample_size,
            height_limit,
            threshold,
            elapsed_ms = start.elapsed().as_millis(),
            "Isolation forest fitted"
        );

        Ok(())
    }

    fn classify(&self, features: &Features) -> Result<Label, ControllerError> {
        let threshold = self.threshold.ok_or(ControllerError::ClassifierNotFitted)?;
        if self.score(features)? > threshold {
            Ok(Label::Anomalous)
        } else {
            Ok(Label::Normal)
        }
    }
}

/// Expected path length of an unsuccessful BST search over `n` points
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

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow(points: Vec<Features>, height_limit: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            root: grow_node(points, 0, height_limit, rng),
        }
    }

    fn path_length(&self, features: &Features) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    value,
                    left,
                    right,
                } => {
                    node = if features.0[*feature] < *value { &**left } else { &**right };
                    depth += 1;
                }
            }
        }
    }
}

fn grow_node(points: Vec<Features>, depth: usize, height_limit: usize, rng: &mut ChaCha8Rng) -> Node {
    if depth >= height_limit || points.len() <= 1 {
        return Node::Leaf { size: points.len() };
    }

    // Only features that still vary inside this node can split it
    let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
        .filter_map(|dim| {
            let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.0[dim]), hi.max(p.0[dim]))
            });
            (hi > lo).then_some((dim, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: points.len() };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let value = rng.gen_range(lo..hi);
    let (left, right): (Vec<Features>, Vec<Features>) =
        points.into_iter().partition(|p| p.0[feature] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow_node(left, depth + 1, height_limit, rng)),
        right: Box::new(grow_node(right, depth + 1, height_limit, rng)),
    }
}
