//! Seconds → milliseconds correction for timing values.
//!
//! Upstream benchmark programs do not agree on a unit: some write seconds into
//! a column named `time_ms`, and `/usr/bin/time` reports user time in seconds.
//! Values that are implausibly small are assumed to be seconds and multiplied
//! up. This is a lossy heuristic, not a unit system: a genuinely sub-threshold
//! measurement will be rescaled too. That misfire is an accepted limitation.

use crate::config::NormalizationConfig;

/// Applies the configured thresholds to single samples and whole columns.
#[derive(Debug, Clone)]
pub struct UnitNormalizer {
    single_threshold: f64,
    batch_mean_threshold: f64,
    factor: f64,
}

impl UnitNormalizer {
    pub fn new(config: &NormalizationConfig) -> Self {
        Self {
            single_threshold: config.user_time_threshold,
            batch_mean_threshold: config.batch_mean_threshold,
            factor: config.factor,
        }
    }

    /// Rescale one sample if it falls below the single-sample threshold.
    ///
    /// `context` names the value in the diagnostic (e.g. the algorithm).
    pub fn normalize_sample(&self, value: f64, context: &str) -> f64 {
        if value < self.single_threshold {
            tracing::info!(
                context,
                value,
                factor = self.factor,
                "converting sample from s to ms"
            );
            value * self.factor
        } else {
            value
        }
    }

    /// Rescale the whole column in place if its mean falls below the batch
    /// threshold. Returns whether a conversion was applied.
    ///
    /// An empty column has no mean and is left alone.
    pub fn normalize_batch(&self, values: &mut [f64], context: &str) -> bool {
        if values.is_empty() {
            return false;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        if mean < self.batch_mean_threshold {
            tracing::info!(
                context,
                mean,
                factor = self.factor,
                "converting column from s to ms"
            );
            for v in values.iter_mut() {
                *v *= self.factor;
            }
            true
        } else {
            false
        }
    }
}

impl Default for UnitNormalizer {
    fn default() -> Self {
        Self::new(&NormalizationConfig::default())
    }
}
