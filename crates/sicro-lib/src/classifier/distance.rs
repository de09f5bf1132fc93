//! Distance-from-mean outlier rule
//!
//! Flags samples whose Euclidean distance from the batch centroid, measured
//! in standardized units, lies in the top `contamination` fraction.

use super::{contamination_threshold, AnomalyClassifier};
use crate::error::ControllerError;
use crate::models::{Features, Label, FEATURE_COUNT};

pub struct DistanceClassifier {
    contamination: f64,
    centroid: [f64; FEATURE_COUNT],
    threshold: Option<f64>,
}

impl DistanceClassifier {
    pub fn new(contamination: f64) -> Self {
        Self {
            contamination,
            centroid: [0.0; FEATURE_COUNT],
            threshold: None,
        }
    }

    pub fn distance(&self, features: &Features) -> f64 {
        features
            .0
            .iter()
            .zip(&self.centroid)
            .map(|(v, c)| (v - c).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl AnomalyClassifier for DistanceClassifier {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn fit(&mut self, features: &[Features]) -> Result<(), ControllerError> {
        if features.is_empty() {
            self.threshold = None;
            return Ok(());
        }

        let n = features.len() as f64;
        for dim in 0..FEATURE_COUNT {
            self.centroid[dim] = features.iter().map(|f| f.0[dim]).sum::<f64>() / n;
        }

        let distances = features.iter().map(|f| self.distance(f)).collect();
        self.threshold = Some(contamination_threshold(distances, self.contamination));
        Ok(())
    }

    fn classify(&self, features: &Features) -> Result<Label, ControllerError> {
        let threshold = self.threshold.ok_or(ControllerError::ClassifierNotFitted)?;
        if self.distance(features) > threshold {
            Ok(Label::Anomalous)
        } else {
            Ok(Label::Normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farthest_points_flagged() {
        let mut points: Vec<Features> = (0..98)
            .map(|i| Features::new((i % 5) as f64 * 0.1, (i % 3) as f64 * 0.1))
            .collect();
        points.push(Features::new(8.0, 8.0));
        points.push(Features::new(-7.0, 9.0));

        let mut classifier = DistanceClassifier::new(0.02);
        classifier.fit(&points).unwrap();

        let flagged: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| classifier.classify(p).unwrap().is_anomalous())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![98, 99]);
    }

    #[test]
    fn test_unfitted_errors() {
        let classifier = DistanceClassifier::new(0.02);
        assert!(classifier.classify(&Features::new(1.0, 1.0)).is_err());
    }
}
