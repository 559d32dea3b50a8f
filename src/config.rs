use crate::application::data::PipelineSettings;
use crate::application::ml::{ForestConfig, TrainingConfig};
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model_path: PathBuf,
    pub seed: u64,
    pub training_samples: usize,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub test_fraction: f64,
    pub n_products: usize,
    pub days: usize,
    pub data_lake_root: PathBuf,
    pub data_lake_enabled: bool,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let model_path = env::var("PRICING_MODEL_PATH")
            .unwrap_or_else(|_| "models/pricing_model.json".to_string())
            .into();

        let seed = env::var("PRICING_SEED")
            .unwrap_or_else(|_| "42".to_string())
            .parse::<u64>()
            .context("Failed to parse PRICING_SEED")?;

        let training_samples = env::var("PRICING_TRAINING_SAMPLES")
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<usize>()
            .context("Failed to parse PRICING_TRAINING_SAMPLES")?;

        let n_trees = env::var("PRICING_N_TREES")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<usize>()
            .context("Failed to parse PRICING_N_TREES")?;

        let max_depth = env::var("PRICING_MAX_DEPTH")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .context("Failed to parse PRICING_MAX_DEPTH")?;

        let min_samples_split = env::var("PRICING_MIN_SAMPLES_SPLIT")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<usize>()
            .context("Failed to parse PRICING_MIN_SAMPLES_SPLIT")?;

        let test_fraction = env::var("PRICING_TEST_FRACTION")
            .unwrap_or_else(|_| "0.2".to_string())
            .parse::<f64>()
            .context("Failed to parse PRICING_TEST_FRACTION")?;

        let n_products = env::var("PIPELINE_N_PRODUCTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<usize>()
            .context("Failed to parse PIPELINE_N_PRODUCTS")?;

        let days = env::var("PIPELINE_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<usize>()
            .context("Failed to parse PIPELINE_DAYS")?;

        let data_lake_root = env::var("DATA_LAKE_ROOT")
            .unwrap_or_else(|_| "data/lake".to_string())
            .into();

        let data_lake_enabled = env::var("DATA_LAKE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("Failed to parse DATA_LAKE_ENABLED")?;

        let config = Self {
            model_path,
            seed,
            training_samples,
            n_trees,
            max_depth,
            min_samples_split,
            test_fraction,
            n_products,
            days,
            data_lake_root,
            data_lake_enabled,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!(
                "Invalid PRICING_TEST_FRACTION: {}. Must be between 0 and 1",
                self.test_fraction
            );
        }
        if self.training_samples < 2 {
            bail!(
                "Invalid PRICING_TRAINING_SAMPLES: {}. Need at least 2",
                self.training_samples
            );
        }
        self.forest_config()
            .validate()
            .context("Invalid forest configuration")?;
        Ok(())
    }

    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
            ..Default::default()
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            n_samples: self.training_samples,
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            n_products: self.n_products,
            days: self.days,
            seed: self.seed,
        }
    }
}
