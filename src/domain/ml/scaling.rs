//! Per-feature standardization fitted on training data.

use super::feature_registry::{FeatureVector, NUM_FEATURES};
use crate::domain::errors::PricingError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ScalingParameters {
    /// Learns mean and population standard deviation per feature.
    /// Constant features get a unit scale so they map to zero.
    pub fn fit(samples: &[FeatureVector]) -> Result<Self, PricingError> {
        if samples.is_empty() {
            return Err(PricingError::training("cannot fit scaler on an empty sample"));
        }

        let mut mean = Vec::with_capacity(NUM_FEATURES);
        let mut std = Vec::with_capacity(NUM_FEATURES);
        for idx in 0..NUM_FEATURES {
            let column: Vec<f64> = samples.iter().map(|s| s.get(idx)).collect();
            let mu = column.iter().mean();
            let sigma = column.iter().population_std_dev();
            if !mu.is_finite() || !sigma.is_finite() {
                return Err(PricingError::training(format!(
                    "non-finite statistics for feature {}",
                    idx
                )));
            }
            mean.push(mu);
            std.push(if sigma > 0.0 { sigma } else { 1.0 });
        }

        Ok(Self { mean, std })
    }

    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; NUM_FEATURES];
        for (idx, value) in scaled.iter_mut().enumerate() {
            *value = (features.get(idx) - self.mean[idx]) / self.std[idx];
        }
        FeatureVector(scaled)
    }

    pub fn transform_all(&self, features: &[FeatureVector]) -> Vec<FeatureVector> {
        features.iter().map(|f| self.transform(f)).collect()
    }

    /// Structural check applied to parameters read back from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != NUM_FEATURES || self.std.len() != NUM_FEATURES {
            return Err(format!(
                "expected {} scaling entries, found mean={} std={}",
                NUM_FEATURES,
                self.mean.len(),
                self.std.len()
            ));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("non-finite scaling mean".to_string());
        }
        if self.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaling std must be finite and positive".to_string());
        }
        Ok(())
    }
}
