//! Metric sources feeding the controller
//!
//! A source hands over an ordered, gap-free batch of samples whose values
//! are already clamped to their valid ranges. Downstream stages do not
//! re-validate.

mod file;
mod simulator;

pub use file::{write_samples, SampleFile};
pub use simulator::{Injection, TrafficProfile, TrafficSimulator};

use crate::models::Sample;
use anyhow::Result;

/// Trait for metric source implementations
pub trait MetricSource {
    /// Short description used in logs
    fn name(&self) -> &str;

    /// Produce the complete batch of samples in timestamp order
    fn samples(&mut self) -> Result<Vec<Sample>>;
}

/// Clamp a utilization percentage into `[0, 100]`
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
