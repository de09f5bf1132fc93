//! Controller configuration
//!
//! Every knob the pipeline uses is carried here and threaded explicitly into
//! the aggregator, decision engine and controller loop.

use crate::error::ControllerError;
use serde::{Deserialize, Serialize};

/// Top-level controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Upper bound on replicas
    pub max_replicas: u32,

    /// Lower bound on replicas
    pub min_replicas: u32,

    /// Replica count before the first decision (defaults to `min_replicas`)
    pub initial_replicas: Option<u32>,

    /// Evaluate a decision every N samples
    pub decision_interval: usize,

    /// Sustained-anomaly vote used to scale up
    pub alert_window: WindowConfig,

    /// Sustained-normal vote used to scale down
    pub stability_window: WindowConfig,

    pub classifier: ClassifierConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_replicas: 5,
            min_replicas: 1,
            initial_replicas: None,
            decision_interval: 10,
            alert_window: WindowConfig::new(5, 3),
            stability_window: WindowConfig::new(10, 8),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Replica count the controller starts from
    pub fn starting_replicas(&self) -> u32 {
        self.initial_replicas.unwrap_or(self.min_replicas)
    }

    /// Check every invariant the pipeline relies on
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.min_replicas == 0 {
            return Err(ControllerError::invalid("min_replicas must be at least 1"));
        }
        if self.min_replicas > self.max_replicas {
            return Err(ControllerError::invalid(format!(
                "min_replicas ({}) exceeds max_replicas ({})",
                self.min_replicas, self.max_replicas
            )));
        }
        let start = self.starting_replicas();
        if start < self.min_replicas || start > self.max_replicas {
            return Err(ControllerError::invalid(format!(
                "initial_replicas ({}) outside [{}, {}]",
                start, self.min_replicas, self.max_replicas
            )));
        }
        if self.decision_interval == 0 {
            return Err(ControllerError::invalid("decision_interval must be positive"));
        }
        self.alert_window.validate("alert_window")?;
        self.stability_window.validate("stability_window")?;
        self.classifier.validate()
    }
}

/// Sliding vote window: `threshold` hits among the last `size` labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub size: usize,
    pub threshold: usize,
}

impl WindowConfig {
    pub fn new(size: usize, threshold: usize) -> Self {
        Self { size, threshold }
    }

    fn validate(&self, name: &str) -> Result<(), ControllerError> {
        if self.size == 0 {
            return Err(ControllerError::invalid(format!("{name}.size must be positive")));
        }
        if self.threshold == 0 {
            return Err(ControllerError::invalid(format!(
                "{name}.threshold must be positive"
            )));
        }
        if self.threshold > self.size {
            return Err(ControllerError::invalid(format!(
                "{name}.threshold ({}) exceeds window size ({})",
                self.threshold, self.size
            )));
        }
        Ok(())
    }
}

/// Which outlier model backs the classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Randomized recursive partitioning ensemble
    #[default]
    IsolationForest,
    /// Distance from the mean in standardized space
    Distance,
}

/// Outlier model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,

    /// Expected fraction of anomalous samples
    pub contamination: f64,

    pub seed: u64,

    /// Number of isolation trees
    pub n_estimators: usize,

    /// Subsample size per tree (capped at the batch size)
    pub max_samples: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::IsolationForest,
            contamination: 0.02,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<(), ControllerError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ControllerError::invalid(format!(
                "classifier.contamination ({}) must be in (0, 0.5]",
                self.contamination
            )));
        }
        if self.n_estimators == 0 {
            return Err(ControllerError::invalid("classifier.n_estimators must be positive"));
        }
        if self.max_samples == 0 {
            return Err(ControllerError::invalid("classifier.max_samples must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_replicas, 5);
        assert_eq!(config.min_replicas, 1);
        assert_eq!(config.decision_interval, 10);
        assert_eq!(config.alert_window, WindowConfig::new(5, 3));
        assert_eq!(config.stability_window, WindowConfig::new(10, 8));
        assert_eq!(config.classifier.contamination, 0.02);
        assert_eq!(config.classifier.seed, 42);
        assert_eq!(config.starting_replicas(), 1);
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = ControllerConfig {
            min_replicas: 6,
            max_replicas: 5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = ControllerConfig {
            alert_window: WindowConfig::new(0, 0),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alert_window.size"));
    }

    #[test]
    fn test_threshold_above_window_rejected() {
        let config = ControllerConfig {
            stability_window: WindowConfig::new(10, 11),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stability_window.threshold"));
    }

    #[test]
    fn test_initial_replicas_out_of_range() {
        let config = ControllerConfig {
            initial_replicas: Some(9),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ControllerConfig {
            initial_replicas: Some(3),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.starting_replicas(), 3);
    }

    #[test]
    fn test_contamination_bounds() {
        for contamination in [0.0, -0.1, 0.6, f64::NAN] {
            let config = ControllerConfig {
                classifier: ClassifierConfig {
                    contamination,
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{contamination} accepted");
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"max_replicas": 8, "alert_window": {"size": 4, "threshold": 2}}"#)
                .unwrap();
        assert_eq!(config.max_replicas, 8);
        assert_eq!(config.min_replicas, 1);
        assert_eq!(config.alert_window, WindowConfig::new(4, 2));
        assert_eq!(config.classifier.kind, ClassifierKind::IsolationForest);
    }
}
