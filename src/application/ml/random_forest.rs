use super::decision_tree::{RegressionTree, TreeParams};
use super::predictor::Regressor;
use crate::domain::errors::PricingError;
use crate::domain::ml::{FeatureVector, NUM_FEATURES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.n_trees == 0 {
            return Err(PricingError::InvalidInput {
                reason: "n_trees must be at least 1".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(PricingError::InvalidInput {
                reason: "max_depth must be at least 1".to_string(),
            });
        }
        if self.min_samples_split < 2 {
            return Err(PricingError::InvalidInput {
                reason: "min_samples_split must be at least 2".to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(PricingError::InvalidInput {
                reason: "min_samples_leaf must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Bagged ensemble of regression trees; predictions are the mean over trees.
///
/// Each tree draws its bootstrap sample from its own generator seeded by the
/// forest seed and the tree index, so the fitted forest does not depend on how
/// rayon schedules the trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn predict_one(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_one(features)).sum();
        total / self.trees.len() as f64
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl Regressor for RandomForest {
    type Config = ForestConfig;

    const KIND: &'static str = "random_forest";

    fn fit(
        config: &ForestConfig,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<Self, PricingError> {
        config.validate()?;
        if features.is_empty() {
            return Err(PricingError::training("no training samples"));
        }
        if features.len() != targets.len() {
            return Err(PricingError::training(format!(
                "feature/target length mismatch: {} vs {}",
                features.len(),
                targets.len()
            )));
        }
        if features.iter().any(|f| !f.is_finite()) || targets.iter().any(|t| !t.is_finite()) {
            return Err(PricingError::training("training data contains non-finite values"));
        }

        let n = features.len();
        let params = config.tree_params();
        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, tree));
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(features, targets, sample, &params)
            })
            .collect();

        debug!(
            "Fitted {} trees on {} samples (max depth {})",
            trees.len(),
            n,
            config.max_depth
        );

        Ok(Self {
            config: config.clone(),
            trees,
        })
    }

    fn predict(&self, features: &[FeatureVector]) -> Vec<f64> {
        features.iter().map(|f| self.predict_one(f)).collect()
    }

    /// Mean decrease in impurity, averaged over trees and renormalized.
    /// Falls back to uniform weights when no tree ever split.
    fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; NUM_FEATURES];
        for tree in &self.trees {
            for (total, value) in totals.iter_mut().zip(tree.importances()) {
                *total += value;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter().map(|v| v / sum).collect()
        } else {
            vec![1.0 / NUM_FEATURES as f64; NUM_FEATURES]
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.trees.len() != self.config.n_trees {
            return Err(format!(
                "forest declares {} trees but holds {}",
                self.config.n_trees,
                self.trees.len()
            ));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", idx, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(5);
        let features: Vec<FeatureVector> = (0..n)
            .map(|_| {
                FeatureVector([
                    rng.random_range(0.0..10.0),
                    rng.random_range(0.0..10.0),
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                ])
            })
            .collect();
        let targets = features.iter().map(|f| 3.0 * f.get(0) + 0.5 * f.get(1)).collect();
        (features, targets)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 12,
            max_depth: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (features, targets) = linear_data(300);
        let a = RandomForest::fit(&small_config(), &features, &targets).unwrap();
        let b = RandomForest::fit(&small_config(), &features, &targets).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trees().len(), 12);
    }

    #[test]
    fn test_single_thread_pool_matches_default_pool() {
        let (features, targets) = linear_data(200);
        let parallel = RandomForest::fit(&small_config(), &features, &targets).unwrap();

        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let sequential = pool
            .install(|| RandomForest::fit(&small_config(), &features, &targets))
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let (features, targets) = linear_data(400);
        let forest = RandomForest::fit(&small_config(), &features, &targets).unwrap();

        let importances = forest.feature_importances();
        assert_eq!(importances.len(), NUM_FEATURES);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
        // Constant features never split
        assert_eq!(importances[2], 0.0);
    }

    #[test]
    fn test_predictions_track_target() {
        let (features, targets) = linear_data(400);
        let forest = RandomForest::fit(&small_config(), &features, &targets).unwrap();

        let sample = FeatureVector([5.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
        let predicted = forest.predict(&[sample])[0];
        assert!((predicted - 17.5).abs() < 2.5, "predicted {}", predicted);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let config = small_config();
        assert!(matches!(
            RandomForest::fit(&config, &[], &[]),
            Err(PricingError::TrainingFailure { .. })
        ));

        let features = vec![FeatureVector([f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0])];
        assert!(RandomForest::fit(&config, &features, &[1.0]).is_err());

        let zero_trees = ForestConfig {
            n_trees: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_trees.validate(),
            Err(PricingError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_constant_target_gives_uniform_importance() {
        let (features, _) = linear_data(50);
        let targets = vec![4.0; 50];
        let forest = RandomForest::fit(&small_config(), &features, &targets).unwrap();

        let importances = forest.feature_importances();
        assert!(importances.iter().all(|&v| (v - 1.0 / 6.0).abs() < 1e-12));
        assert_eq!(forest.predict(&features[..1])[0], 4.0);
    }
}
