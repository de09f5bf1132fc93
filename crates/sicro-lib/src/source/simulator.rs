//! Synthetic traffic for a simulated day
//!
//! Requests follow a base load with an evening peak and Gaussian noise.
//! CPU and memory track the request count. Two optional faults can be
//! injected: a traffic burst (elevated request noise) and a memory leak
//! (constant memory offset).

use super::{clamp_percent, MetricSource};
use crate::models::Sample;
use anyhow::{ensure, Result};
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Inclusive range of sample indices affected by an injected fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub start: usize,
    pub end: usize,
}

impl Injection {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Shape of the simulated traffic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficProfile {
    pub minutes: usize,
    pub start: DateTime<Utc>,
    pub seed: u64,
    pub base_requests: f64,
    /// Hours of day (inclusive) with peak traffic
    pub peak_start_hour: u32,
    pub peak_end_hour: u32,
    pub peak_multiplier: f64,
    pub min_requests: i64,
    /// Standard deviation of per-minute request noise
    pub request_noise: f64,
    /// Standard deviation of cpu/memory noise
    pub resource_noise: f64,
    pub burst: Option<Injection>,
    pub burst_mean: f64,
    pub burst_std: f64,
    pub memory_leak: Option<Injection>,
    pub leak_offset: f64,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            minutes: 1440,
            start: Utc
                .with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            seed: 42,
            base_requests: 100.0,
            peak_start_hour: 18,
            peak_end_hour: 22,
            peak_multiplier: 2.5,
            min_requests: 10,
            request_noise: 15.0,
            resource_noise: 5.0,
            burst: Some(Injection::new(600, 615)),
            burst_mean: 50.0,
            burst_std: 5.0,
            memory_leak: Some(Injection::new(840, 860)),
            leak_offset: 40.0,
        }
    }
}

/// Seeded generator of per-minute samples
pub struct TrafficSimulator {
    profile: TrafficProfile,
}

impl TrafficSimulator {
    pub fn new(profile: TrafficProfile) -> Self {
        Self { profile }
    }

    /// Generate the full day; identical seeds give identical output
    pub fn generate(&self) -> Vec<Sample> {
        let p = &self.profile;
        let mut rng = ChaCha8Rng::seed_from_u64(p.seed);

        (0..p.minutes)
            .map(|i| {
                let timestamp = p.start + Duration::minutes(i as i64);
                let hour = timestamp.hour();
                let multiplier = if (p.peak_start_hour..=p.peak_end_hour).contains(&hour) {
                    p.peak_multiplier
                } else {
                    1.0
                };

                let noise = if p.burst.is_some_and(|b| b.contains(i)) {
                    gaussian(&mut rng, p.burst_mean, p.burst_std)
                } else {
                    gaussian(&mut rng, 0.0, p.request_noise)
                };
                let requests = ((p.base_requests * multiplier + noise) as i64).max(p.min_requests);

                let mut cpu = requests as f64 / 3.0 + gaussian(&mut rng, 0.0, p.resource_noise);
                let mut memory = requests as f64 / 2.0 + gaussian(&mut rng, 0.0, p.resource_noise);

                if p.memory_leak.is_some_and(|leak| leak.contains(i)) {
                    memory += p.leak_offset;
                }

                cpu = clamp_percent(cpu);
                memory = clamp_percent(memory);

                Sample {
                    timestamp,
                    cpu_usage: cpu,
                    memory_usage: memory,
                    request_count: requests.max(0) as u64,
                }
            })
            .collect()
    }
}

impl MetricSource for TrafficSimulator {
    fn name(&self) -> &str {
        "traffic_simulator"
    }

    fn samples(&mut self) -> Result<Vec<Sample>> {
        ensure!(
            self.profile.peak_start_hour <= self.profile.peak_end_hour,
            "peak_start_hour ({}) is after peak_end_hour ({})",
            self.profile.peak_start_hour,
            self.profile.peak_end_hour
        );
        Ok(self.generate())
    }
}

/// Box-Muller draw from `N(mean, std_dev^2)`
fn gaussian(rng: &mut ChaCha8Rng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
