//! Samples replayed from a JSON file

use super::{clamp_percent, MetricSource};
use crate::models::Sample;
use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JSON array of samples on disk
pub struct SampleFile {
    path: PathBuf,
    name: String,
}

impl SampleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

impl MetricSource for SampleFile {
    fn name(&self) -> &str {
        &self.name
    }

    /// Load, clamp out-of-range utilization, and check ordering
    fn samples(&mut self) -> Result<Vec<Sample>> {
        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read sample file {:?}", self.path))?;
        let mut samples: Vec<Sample> =
            serde_json::from_slice(&data).context("Failed to parse sample file")?;

        let mut clamped = 0usize;
        for (index, sample) in samples.iter_mut().enumerate() {
            let cpu = clamp_percent(sample.cpu_usage);
            let memory = clamp_percent(sample.memory_usage);
            if cpu != sample.cpu_usage || memory != sample.memory_usage {
                warn!(
                    index,
                    cpu_usage = sample.cpu_usage,
                    memory_usage = sample.memory_usage,
                    "Clamping out-of-range sample"
                );
                sample.cpu_usage = cpu;
                sample.memory_usage = memory;
                clamped += 1;
            }
        }

        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            let (previous, next) = (&samples[index], &samples[index + 1]);
            if next.timestamp == previous.timestamp {
                bail!(
                    "Duplicate sample {} at {} repeats sample {}",
                    index + 1,
                    next.timestamp,
                    index
                );
            }
            bail!(
                "Sample {} at {} precedes sample {} at {}",
                index + 1,
                next.timestamp,
                index,
                previous.timestamp
            );
        }

        debug!(path = %self.path.display(), samples = samples.len(), clamped, "Sample file loaded");
        Ok(samples)
    }
}

/// Save samples as a JSON array that `SampleFile` can read back
pub fn write_samples(path: &Path, samples: &[Sample]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let json = serde_json::to_vec_pretty(samples).context("Failed to serialize samples")?;
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to create sample file {:?}", path))?;
    file.write_all(&json).context("Failed to write samples")?;

    Ok(())
}
