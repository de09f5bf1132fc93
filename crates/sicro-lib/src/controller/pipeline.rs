//! Batch pipeline: classify, aggregate, decide

use super::ControllerLoop;
use crate::audit::AuditLog;
use crate::classifier::{AnomalyClassifier, BatchClassifier};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::models::{Sample, ScalingAction, ScalingEvent, TimelinePoint};
use crate::observability::{ControllerMetrics, StructuredLogger};
use crate::stability::StabilityAggregator;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Everything produced by one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Outlier model that labeled the batch
    pub model: String,
    /// Scaling events in arrival order
    pub events: Vec<ScalingEvent>,
    /// Replica count per sample
    pub replicas: Vec<u32>,
    /// Per-sample metrics, label, flags and replicas
    pub timeline: Vec<TimelinePoint>,
    /// Samples labeled anomalous
    pub anomalies: usize,
}

impl RunReport {
    pub fn audit_log(&self) -> AuditLog {
        AuditLog::from_events(self.events.clone())
    }

    pub fn final_replicas(&self) -> Option<u32> {
        self.replicas.last().copied()
    }

    pub fn count(&self, action: ScalingAction) -> usize {
        self.events.iter().filter(|e| e.action == action).count()
    }

    pub fn samples(&self) -> usize {
        self.timeline.len()
    }
}

/// Single-threaded batch pipeline over a finite sample set
pub struct Pipeline {
    config: ControllerConfig,
    classifier: BatchClassifier,
    logger: StructuredLogger,
    metrics: ControllerMetrics,
}

impl Pipeline {
    /// Validate the configuration and build the default classifier
    pub fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        let classifier = BatchClassifier::from_config(&config.classifier);

        Ok(Self {
            config,
            classifier,
            logger: StructuredLogger::new("sicro"),
            metrics: ControllerMetrics::new(),
        })
    }

    /// Swap in a different outlier model
    pub fn with_classifier(mut self, model: Box<dyn AnomalyClassifier>) -> Self {
        self.classifier = BatchClassifier::new(model);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Run the whole batch
    ///
    /// The classifier is fitted over every sample before the first decision.
    /// An empty batch yields an empty report.
    pub fn run(&mut self, samples: &[Sample]) -> Result<RunReport, ControllerError> {
        let start = Instant::now();
        let classified = self.classifier.classify_batch(samples)?;
        self.metrics
            .observe_classification_latency(start.elapsed().as_secs_f64());

        let anomalies = classified.iter().filter(|c| c.label.is_anomalous()).count();
        self.metrics.add_samples_classified(classified.len() as u64);
        self.metrics.add_anomalies_flagged(anomalies as u64);
        self.logger
            .log_classification(self.classifier.model_name(), classified.len(), anomalies);

        let mut aggregator = StabilityAggregator::from_config(&self.config);
        let mut controller = ControllerLoop::new(&self.config)?;
        let mut timeline = Vec::with_capacity(classified.len());

        for item in &classified {
            let flags = aggregator.observe(item.label);
            let outcome = controller.tick(item.sample.timestamp, flags);

            if outcome.decision.is_some() {
                self.metrics.inc_decision_ticks();
            }
            if let Some(event) = &outcome.event {
                self.metrics.record_scaling_event(event.action);
                self.logger.log_scaling_event(event);
            }
            self.metrics.set_current_replicas(outcome.replicas);

            timeline.push(TimelinePoint {
                timestamp: item.sample.timestamp,
                cpu_usage: item.sample.cpu_usage,
                memory_usage: item.sample.memory_usage,
                request_count: item.sample.request_count,
                label: item.label,
                is_alert: flags.is_alert,
                is_stable: flags.is_stable,
                replicas: outcome.replicas,
            });
        }

        let final_replicas = controller.state().current_replicas();
        let (events, replicas) = controller.into_parts();
        self.logger.log_run_complete(timeline.len(), events.len(), final_replicas);

        info!(
            samples = timeline.len(),
            anomalies,
            events = events.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Pipeline run finished"
        );

        Ok(RunReport {
            model: self.classifier.model_name().to_string(),
            events,
            replicas,
            timeline,
            anomalies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Features, Label};
    use chrono::{Duration, TimeZone, Utc};

    /// Labels anomalous whenever standardized cpu is above zero
    struct AboveMean;

    impl AnomalyClassifier for AboveMean {
        fn name(&self) -> &'static str {
            "above_mean"
        }

        fn fit(&mut self, _features: &[Features]) -> Result<(), ControllerError> {
            Ok(())
        }

        fn classify(&self, features: &Features) -> Result<Label, ControllerError> {
            Ok(if features.0[0] > 0.0 {
                Label::Anomalous
            } else {
                Label::Normal
            })
        }
    }

    fn samples(cpu: &[f64]) -> Vec<Sample> {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        cpu.iter()
            .enumerate()
            .map(|(i, &c)| Sample {
                timestamp: start + Duration::minutes(i as i64),
                cpu_usage: c,
                memory_usage: 40.0,
                request_count: 100,
            })
            .collect()
    }

    #[test]
    fn test_empty_stream_produces_empty_report() {
        let mut pipeline = Pipeline::new(ControllerConfig::default()).unwrap();
        let report = pipeline.run(&[]).unwrap();

        assert!(report.events.is_empty());
        assert!(report.replicas.is_empty());
        assert!(report.timeline.is_empty());
        assert_eq!(report.final_replicas(), None);
        assert_eq!(report.audit_log().render(), "");
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let config = ControllerConfig {
            min_replicas: 4,
            max_replicas: 2,
            ..Default::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_custom_classifier_drives_scaling() {
        // 20 quiet samples, a 10-sample surge, then 40 quiet samples
        let mut cpu = vec![10.0; 20];
        cpu.extend([90.0; 10]);
        cpu.extend([10.0; 40]);

        let mut pipeline = Pipeline::new(ControllerConfig::default())
            .unwrap()
            .with_classifier(Box::new(AboveMean));
        let report = pipeline.run(&samples(&cpu)).unwrap();

        assert_eq!(report.model, "above_mean");
        assert_eq!(report.anomalies, 10);
        assert_eq!(report.samples(), 70);
        assert_eq!(report.replicas.len(), 70);

        let actions: Vec<(usize, ScalingAction, u32)> = report
            .events
            .iter()
            .map(|e| (e.tick, e.action, e.resulting_replicas))
            .collect();
        // Tick 20 sees one anomaly, tick 30 sees four of the last five.
        // By tick 40 the stability window holds ten normals again.
        assert_eq!(
            actions,
            vec![
                (30, ScalingAction::ScaleUp, 2),
                (40, ScalingAction::ScaleDown, 1),
            ]
        );
        assert_eq!(report.count(ScalingAction::ScaleUp), 1);
        assert_eq!(report.final_replicas(), Some(1));

        let point = &report.timeline[30];
        assert!(point.is_alert);
        assert_eq!(point.label, Label::Normal);
        assert_eq!(report.timeline[29].label, Label::Anomalous);
        assert_eq!(point.replicas, 2);
        assert_eq!(report.timeline[39].replicas, 2);
    }
}
