//! Observability infrastructure for the controller
//!
//! Provides:
//! - Prometheus metrics (samples, anomalies, decisions, scaling events, replicas)
//! - Structured logging of pipeline events with tracing

use crate::models::{ScalingAction, ScalingEvent};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for classifier fit latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ControllerMetricsInner> = OnceLock::new();

struct ControllerMetricsInner {
    classification_latency_seconds: Histogram,
    samples_classified: IntCounter,
    anomalies_flagged: IntCounter,
    decision_ticks: IntCounter,
    scaling_events: IntCounterVec,
    current_replicas: IntGauge,
}

impl ControllerMetricsInner {
    fn new() -> Self {
        Self {
            classification_latency_seconds: register_histogram!(
                "sicro_classification_latency_seconds",
                "Time spent fitting and applying the anomaly classifier",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register classification_latency_seconds"),

            samples_classified: register_int_counter!(
                "sicro_samples_classified_total",
                "Total number of samples labeled by the classifier"
            )
            .expect("Failed to register samples_classified"),

            anomalies_flagged: register_int_counter!(
                "sicro_anomalies_flagged_total",
                "Total number of samples labeled anomalous"
            )
            .expect("Failed to register anomalies_flagged"),

            decision_ticks: register_int_counter!(
                "sicro_decision_ticks_total",
                "Total number of decision ticks evaluated"
            )
            .expect("Failed to register decision_ticks"),

            scaling_events: register_int_counter_vec!(
                "sicro_scaling_events_total",
                "Total number of replica changes by direction",
                &["action"]
            )
            .expect("Failed to register scaling_events"),

            current_replicas: register_int_gauge!(
                "sicro_current_replicas",
                "Replica count after the most recent tick"
            )
            .expect("Failed to register current_replicas"),
        }
    }
}

/// Controller metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ControllerMetrics {
    _private: (),
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    /// Get a handle to the global metrics, registering them on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ControllerMetricsInner {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new)
    }

    /// Record how long a batch fit and label pass took
    pub fn observe_classification_latency(&self, duration_secs: f64) {
        self.inner().classification_latency_seconds.observe(duration_secs);
    }

    /// Count samples labeled by the classifier
    pub fn add_samples_classified(&self, count: u64) {
        self.inner().samples_classified.inc_by(count);
    }

    /// Count samples labeled anomalous
    pub fn add_anomalies_flagged(&self, count: u64) {
        self.inner().anomalies_flagged.inc_by(count);
    }

    /// Count a tick on which the decision engine ran
    pub fn inc_decision_ticks(&self) {
        self.inner().decision_ticks.inc();
    }

    /// Record a scale up or scale down; maintain is not counted
    pub fn record_scaling_event(&self, action: ScalingAction) {
        let label = match action {
            ScalingAction::ScaleUp => "scale_up",
            ScalingAction::ScaleDown => "scale_down",
            ScalingAction::Maintain => return,
        };
        self.inner().scaling_events.with_label_values(&[label]).inc();
    }

    /// Update the current replica gauge
    pub fn set_current_replicas(&self, replicas: u32) {
        self.inner().current_replicas.set(replicas as i64);
    }

    /// Total scaling events recorded for an action
    pub fn scaling_events_total(&self, action: ScalingAction) -> u64 {
        let label = match action {
            ScalingAction::ScaleUp => "scale_up",
            ScalingAction::ScaleDown => "scale_down",
            ScalingAction::Maintain => return 0,
        };
        self.inner().scaling_events.with_label_values(&[label]).get()
    }
}

/// Structured logger for controller events
#[derive(Clone)]
pub struct StructuredLogger {
    controller: String,
}

impl StructuredLogger {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
        }
    }

    pub fn log_startup(&self, version: &str, max_replicas: u32, min_replicas: u32, decision_interval: usize) {
        info!(
            event = "controller_started",
            controller = %self.controller,
            version = %version,
            max_replicas,
            min_replicas,
            decision_interval,
            "Controller initializing"
        );
    }

    pub fn log_source(&self, source: &str, samples: usize) {
        if samples == 0 {
            warn!(
                event = "metric_stream_empty",
                controller = %self.controller,
                source = %source,
                "Metric source produced no samples"
            );
        } else {
            info!(
                event = "metric_stream_loaded",
                controller = %self.controller,
                source = %source,
                samples,
                "Metric stream loaded"
            );
        }
    }

    pub fn log_classification(&self, model: &str, samples: usize, anomalies: usize) {
        info!(
            event = "classification_complete",
            controller = %self.controller,
            model = %model,
            samples,
            anomalies,
            "Anomaly classification complete"
        );
    }

    pub fn log_scaling_event(&self, event: &ScalingEvent) {
        info!(
            event = "scaling_event",
            controller = %self.controller,
            timestamp = %event.timestamp.to_rfc3339(),
            tick = event.tick,
            action = %event.action,
            replicas = event.resulting_replicas,
            "Scaling decision applied"
        );
    }

    pub fn log_run_complete(&self, samples: usize, events: usize, final_replicas: u32) {
        info!(
            event = "run_complete",
            controller = %self.controller,
            samples,
            scaling_events = events,
            final_replicas,
            "Infrastructure optimized"
        );
    }

    pub fn log_artifact(&self, kind: &str, path: &str) {
        info!(
            event = "artifact_written",
            controller = %self.controller,
            kind = %kind,
            path = %path,
            "Artifact written"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_metrics_recording() {
        let metrics = ControllerMetrics::new();
        let before = metrics.scaling_events_total(ScalingAction::ScaleUp);

        metrics.observe_classification_latency(0.01);
        metrics.add_samples_classified(10);
        metrics.add_anomalies_flagged(1);
        metrics.inc_decision_ticks();
        metrics.record_scaling_event(ScalingAction::ScaleUp);
        metrics.record_scaling_event(ScalingAction::Maintain);
        metrics.set_current_replicas(2);

        assert!(metrics.scaling_events_total(ScalingAction::ScaleUp) > before);
        assert_eq!(metrics.scaling_events_total(ScalingAction::Maintain), 0);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-controller");
        assert_eq!(logger.controller, "test-controller");
    }
}
