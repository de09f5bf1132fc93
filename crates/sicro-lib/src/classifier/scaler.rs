//! Zero-mean, unit-variance feature scaling

use crate::models::{Features, FEATURE_COUNT};

/// Per-feature standardization fitted over a batch
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Identity scaler until fitted
    pub fn new() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }

    /// Compute population mean and standard deviation for each feature
    ///
    /// A constant feature gets a scale of 1.0 so it standardizes to zero.
    pub fn fit(&mut self, batch: &[Features]) {
        if batch.is_empty() {
            *self = Self::new();
            return;
        }
        let n = batch.len() as f64;

        for dim in 0..FEATURE_COUNT {
            let mean = batch.iter().map(|f| f.0[dim]).sum::<f64>() / n;
            let variance = batch.iter().map(|f| (f.0[dim] - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();

            self.mean[dim] = mean;
            self.scale[dim] = if std_dev < f64::EPSILON { 1.0 } else { std_dev };
        }
    }

    pub fn transform(&self, features: &Features) -> Features {
        let mut out = [0.0; FEATURE_COUNT];
        for (dim, value) in out.iter_mut().enumerate() {
            *value = (features.0[dim] - self.mean[dim]) / self.scale[dim];
        }
        Features(out)
    }

    pub fn mean(&self) -> &[f64; FEATURE_COUNT] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; FEATURE_COUNT] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardized_batch_has_zero_mean_unit_variance() {
        let batch: Vec<Features> = (0..100)
            .map(|i| Features::new(i as f64, 50.0 + (i % 10) as f64 * 3.0))
            .collect();
        let mut scaler = StandardScaler::new();
        scaler.fit(&batch);

        let scaled: Vec<Features> = batch.iter().map(|f| scaler.transform(f)).collect();
        for dim in 0..FEATURE_COUNT {
            let mean = scaled.iter().map(|f| f.0[dim]).sum::<f64>() / 100.0;
            let var = scaled.iter().map(|f| (f.0[dim] - mean).powi(2)).sum::<f64>() / 100.0;
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_feature() {
        let batch = vec![Features::new(5.0, 40.0); 10];
        let mut scaler = StandardScaler::new();
        scaler.fit(&batch);

        assert_eq!(scaler.mean(), &[5.0, 40.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform(&batch[0]), Features::new(0.0, 0.0));
    }
}
