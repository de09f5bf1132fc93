//! Anomaly classification for resource samples
//!
//! Samples are standardized over the whole batch and handed to an
//! unsupervised outlier model. Two models are provided:
//! - `IsolationForest`: randomized recursive partitioning ensemble
//! - `DistanceClassifier`: distance from the mean in standardized space
//!
//! Both flag roughly the configured contamination fraction as anomalous.

mod distance;
mod isolation_forest;
mod scaler;

pub use distance::DistanceClassifier;
pub use isolation_forest::{average_path_length, IsolationForest};
pub use scaler::StandardScaler;

use crate::config::{ClassifierConfig, ClassifierKind};
use crate::error::ControllerError;
use crate::models::{ClassifiedSample, Features, Label, Sample};
use tracing::debug;

/// Trait for swappable outlier models
pub trait AnomalyClassifier: Send + Sync {
    /// Short model identifier used in logs
    fn name(&self) -> &'static str;

    /// Fit the model over a batch of standardized features
    fn fit(&mut self, features: &[Features]) -> Result<(), ControllerError>;

    /// Label a single standardized feature vector
    fn classify(&self, features: &Features) -> Result<Label, ControllerError>;
}

/// Build the model selected in configuration
pub fn create_classifier(config: &ClassifierConfig) -> Box<dyn AnomalyClassifier> {
    match config.kind {
        ClassifierKind::IsolationForest => Box::new(IsolationForest::from_config(config)),
        ClassifierKind::Distance => Box::new(DistanceClassifier::new(config.contamination)),
    }
}

/// Standardize-then-classify over a complete batch of samples
pub struct BatchClassifier {
    scaler: StandardScaler,
    model: Box<dyn AnomalyClassifier>,
}

impl BatchClassifier {
    pub fn new(model: Box<dyn AnomalyClassifier>) -> Self {
        Self {
            scaler: StandardScaler::new(),
            model,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(create_classifier(config))
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Fit over the batch and label every sample
    ///
    /// Samples are cloned into the output; the input slice is never touched.
    /// An empty batch yields an empty result without fitting.
    pub fn classify_batch(
        &mut self,
        samples: &[Sample],
    ) -> Result<Vec<ClassifiedSample>, ControllerError> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<Features> = samples.iter().map(Sample::features).collect();
        self.scaler.fit(&raw);
        let standardized: Vec<Features> = raw.iter().map(|f| self.scaler.transform(f)).collect();

        self.model.fit(&standardized)?;

        let classified = samples
            .iter()
            .zip(&standardized)
            .map(|(sample, features)| -> Result<ClassifiedSample, ControllerError> {
                Ok(ClassifiedSample {
                    sample: sample.clone(),
                    label: self.model.classify(features)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            model = self.model.name(),
            samples = classified.len(),
            anomalies = classified.iter().filter(|c| c.label.is_anomalous()).count(),
            "Batch classified"
        );

        Ok(classified)
    }
}

/// Linear-interpolated quantile of an ascending slice
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::INFINITY;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Score threshold that leaves `contamination` of the batch above it
pub(crate) fn contamination_threshold(mut scores: Vec<f64>, contamination: f64) -> f64 {
    scores.sort_by(|a, b| a.total_cmp(b));
    quantile(&scores, 1.0 - contamination)
}
