//! Core data models for the controller pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One per-minute resource utilization sample from a metric source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// CPU utilization percentage in `[0, 100]`
    pub cpu_usage: f64,
    /// Memory utilization percentage in `[0, 100]`
    pub memory_usage: f64,
    pub request_count: u64,
}

impl Sample {
    /// Feature vector used by the anomaly classifier
    pub fn features(&self) -> Features {
        Features::new(self.cpu_usage, self.memory_usage)
    }
}

/// Number of features the classifier operates on
pub const FEATURE_COUNT: usize = 2;

/// Classifier input: `(cpu_usage, memory_usage)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features(pub [f64; FEATURE_COUNT]);

impl Features {
    /// Feature vector in `[cpu_usage, memory_usage]` order
    pub fn new(cpu_usage: f64, memory_usage: f64) -> Self {
        Self([cpu_usage, memory_usage])
    }
}

/// Classifier verdict for a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Normal,
    Anomalous,
}

impl Label {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Label::Anomalous)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Normal => write!(f, "normal"),
            Label::Anomalous => write!(f, "anomalous"),
        }
    }
}

/// A sample paired with its classifier label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSample {
    pub sample: Sample,
    pub label: Label,
}

/// Per-sample output of the stability aggregator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityFlags {
    /// Enough recent anomalies to warrant scaling up
    pub is_alert: bool,
    /// Enough recent normal samples to allow scaling down
    pub is_stable: bool,
}

/// Action chosen on a decision tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    ScaleUp,
    ScaleDown,
    Maintain,
}

impl ScalingAction {
    /// Whether this action changes capacity and belongs in the audit trail
    pub fn is_change(&self) -> bool {
        !matches!(self, ScalingAction::Maintain)
    }
}

impl std::fmt::Display for ScalingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingAction::ScaleUp => write!(f, "SCALE UP"),
            ScalingAction::ScaleDown => write!(f, "SCALE DOWN"),
            ScalingAction::Maintain => write!(f, "MAINTAIN"),
        }
    }
}

/// Append-only record of a replica change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingEvent {
    pub timestamp: DateTime<Utc>,
    pub action: ScalingAction,
    pub resulting_replicas: u32,
    /// Index of the sample that triggered the decision
    pub tick: usize,
}

/// Everything the visualization collaborator needs for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub request_count: u64,
    pub label: Label,
    pub is_alert: bool,
    pub is_stable: bool,
    pub replicas: u32,
}
