//! Windowed voting over classifier labels
//!
//! Two independent sliding windows turn the per-sample label stream into
//! sustained-evidence flags: `is_alert` when enough recent samples are
//! anomalous, `is_stable` when enough recent samples are normal. Until a
//! window has filled, the missing slots count as non-hits.

use crate::config::{ControllerConfig, WindowConfig};
use crate::models::{Label, StabilityFlags};
use std::collections::VecDeque;

/// Fixed-size sliding window counting boolean hits
#[derive(Debug, Clone)]
pub struct VoteWindow {
    size: usize,
    threshold: usize,
    votes: VecDeque<bool>,
    hits: usize,
}

impl VoteWindow {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            size: config.size,
            threshold: config.threshold,
            votes: VecDeque::with_capacity(config.size),
            hits: 0,
        }
    }

    /// Record a vote and report whether the window now meets its threshold
    pub fn push(&mut self, hit: bool) -> bool {
        if self.votes.len() == self.size {
            if let Some(true) = self.votes.pop_front() {
                self.hits -= 1;
            }
        }
        self.votes.push_back(hit);
        if hit {
            self.hits += 1;
        }
        self.is_triggered()
    }

    pub fn is_triggered(&self) -> bool {
        self.hits >= self.threshold
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}

/// Produces alert/stability flags for each classified sample in order
#[derive(Debug, Clone)]
pub struct StabilityAggregator {
    alert: VoteWindow,
    stability: VoteWindow,
}

impl StabilityAggregator {
    pub fn new(alert_window: WindowConfig, stability_window: WindowConfig) -> Self {
        Self {
            alert: VoteWindow::new(alert_window),
            stability: VoteWindow::new(stability_window),
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.alert_window, config.stability_window)
    }

    /// Feed the next label and return the flags as of this sample
    pub fn observe(&mut self, label: Label) -> StabilityFlags {
        StabilityFlags {
            is_alert: self.alert.push(label == Label::Anomalous),
            is_stable: self.stability.push(label == Label::Normal),
        }
    }

    /// Flags for a whole label sequence
    pub fn flags_for(&mut self, labels: impl IntoIterator<Item = Label>) -> Vec<StabilityFlags> {
        labels.into_iter().map(|label| self.observe(label)).collect()
    }

    pub fn anomalies_in_alert_window(&self) -> usize {
        self.alert.hits()
    }

    pub fn normals_in_stability_window(&self) -> usize {
        self.stability.hits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Anomalous as A, Normal as N};

    fn default_aggregator() -> StabilityAggregator {
        StabilityAggregator::from_config(&ControllerConfig::default())
    }

    #[test]
    fn test_alert_at_window_fill() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([A, A, A, N, N]);

        assert!(flags[2].is_alert);
        assert!(flags[4].is_alert);
        assert_eq!(agg.anomalies_in_alert_window(), 3);
    }

    #[test]
    fn test_alert_clears_as_anomalies_slide_out() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([A, A, A, N, N, N]);

        // Sixth sample pushes the first anomaly out: 2 of the last 5
        assert!(!flags[5].is_alert);
    }

    #[test]
    fn test_two_anomalies_never_alert() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([A, N, A, N, N, N, A, N]);
        assert!(flags.iter().all(|f| !f.is_alert));
    }

    #[test]
    fn test_stable_after_ten_normals() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([N; 10]);

        assert!(flags[9].is_stable);
        assert!(!flags[6].is_stable);
        assert_eq!(agg.normals_in_stability_window(), 10);
    }

    #[test]
    fn test_missing_history_counts_as_non_normal() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([N; 7]);
        assert!(flags.iter().all(|f| !f.is_stable));

        // Eighth normal meets the threshold of 8 even though the window is not full
        assert!(agg.observe(N).is_stable);
    }

    #[test]
    fn test_stability_tolerates_two_anomalies() {
        let mut agg = default_aggregator();
        let flags = agg.flags_for([N, N, A, N, N, N, A, N, N, N]);
        assert!(flags[9].is_stable);

        let flags = agg.flags_for([A]);
        assert!(!flags[0].is_stable);
    }

    #[test]
    fn test_flags_can_both_assert() {
        let mut agg = StabilityAggregator::new(WindowConfig::new(2, 1), WindowConfig::new(10, 1));
        let flags = agg.observe(A);
        assert!(flags.is_alert);
        assert!(!flags.is_stable);

        let flags = agg.observe(N);
        assert!(flags.is_alert);
        assert!(flags.is_stable);
    }

    #[test]
    fn test_vote_window_len_bounded() {
        let mut window = VoteWindow::new(WindowConfig::new(3, 2));
        assert!(window.is_empty());
        for _ in 0..10 {
            window.push(true);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.hits(), 3);
    }
}
