use super::predictor::Regressor;
use super::random_forest::{ForestConfig, RandomForest};
use super::training_data::{DEFAULT_TRAINING_SAMPLES, synthesize_training_set, train_test_split};
use crate::domain::errors::PricingError;
use crate::domain::ml::{FEATURE_NAMES, FeatureVector, ScalingParameters, TrainingMetrics};
use crate::domain::records::Record;
use crate::infrastructure::model_artifact::{ModelArtifactFile, read_artifact, write_artifact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// How `train` draws and splits its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Size of the synthetic set used when no data is supplied
    pub n_samples: usize,
    pub test_fraction: f64,
    /// Seeds both the synthetic set and the hold-out shuffle
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_samples: DEFAULT_TRAINING_SAMPLES,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Everything a fitted model needs to predict, plus how it scored.
#[derive(Debug, Clone)]
pub struct TrainedArtifact<R> {
    pub regressor: R,
    pub scaling: ScalingParameters,
    pub metrics: TrainingMetrics,
}

impl<R> TrainedArtifact<R> {
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.metrics.trained_at
    }
}

/// Dynamic pricing model: standardizes the six pricing features and maps them
/// to a recommended price through a regression ensemble.
///
/// The model starts untrained. Every successful `train` replaces the artifact
/// wholesale; a failed `train` or `load` leaves the previous artifact in place.
#[derive(Debug)]
pub struct PricingModel<R: Regressor = RandomForest> {
    model_path: PathBuf,
    regressor_config: R::Config,
    training: TrainingConfig,
    artifact: Option<TrainedArtifact<R>>,
}

impl PricingModel<RandomForest> {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self::with_config(model_path, ForestConfig::default(), TrainingConfig::default())
    }
}

impl<R: Regressor> PricingModel<R> {
    pub fn with_config(
        model_path: impl Into<PathBuf>,
        regressor_config: R::Config,
        training: TrainingConfig,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            regressor_config,
            training,
            artifact: None,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn training_config(&self) -> &TrainingConfig {
        &self.training
    }

    pub fn is_trained(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&TrainedArtifact<R>> {
        self.artifact.as_ref()
    }

    pub fn metrics(&self) -> Option<&TrainingMetrics> {
        self.artifact.as_ref().map(|a| &a.metrics)
    }

    pub fn scaling_parameters(&self) -> Option<&ScalingParameters> {
        self.artifact.as_ref().map(|a| &a.scaling)
    }

    /// Trains on a freshly synthesized set of `TrainingConfig::n_samples` rows.
    pub fn train(&mut self) -> Result<TrainingMetrics, PricingError> {
        let (features, targets) = synthesize_training_set(self.training.n_samples, self.training.seed);
        self.train_on(&features, &targets)
    }

    /// Splits, scales, fits and evaluates. The scaler only ever sees the
    /// training split; the test split is transformed with its parameters.
    pub fn train_on(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<TrainingMetrics, PricingError> {
        match self.fit_artifact(features, targets) {
            Ok(artifact) => {
                let metrics = artifact.metrics.clone();
                info!(
                    "Model trained successfully. RMSE: {:.2}, R²: {:.4}",
                    metrics.rmse, metrics.r2_score
                );
                self.artifact = Some(artifact);
                Ok(metrics)
            }
            Err(e) => {
                error!("Failed to train model: {}", e);
                Err(e)
            }
        }
    }

    fn fit_artifact(
        &self,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<TrainedArtifact<R>, PricingError> {
        if features.len() != targets.len() {
            return Err(PricingError::training(format!(
                "feature/target length mismatch: {} vs {}",
                features.len(),
                targets.len()
            )));
        }
        if features.is_empty() {
            return Err(PricingError::training("no training samples"));
        }
        if features.iter().any(|f| !f.is_finite()) || targets.iter().any(|t| !t.is_finite()) {
            return Err(PricingError::training("training data contains non-finite values"));
        }

        let (train_idx, test_idx) =
            train_test_split(features.len(), self.training.test_fraction, self.training.seed)?;

        let x_train: Vec<FeatureVector> = train_idx.iter().map(|&i| features[i]).collect();
        let y_train: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();
        let x_test: Vec<FeatureVector> = test_idx.iter().map(|&i| features[i]).collect();
        let y_test: Vec<f64> = test_idx.iter().map(|&i| targets[i]).collect();

        let scaling = ScalingParameters::fit(&x_train)?;
        let x_train_scaled = scaling.transform_all(&x_train);
        let x_test_scaled = scaling.transform_all(&x_test);

        let regressor = R::fit(&self.regressor_config, &x_train_scaled, &y_train)?;

        let predictions = regressor.predict(&x_test_scaled);
        let metrics = TrainingMetrics::evaluate(&predictions, &y_test, Utc::now());
        if !metrics.is_finite() {
            return Err(PricingError::training("evaluation produced non-finite metrics"));
        }

        Ok(TrainedArtifact {
            regressor,
            scaling,
            metrics,
        })
    }

    /// Predicts one price per feature vector. Fails if the model is untrained.
    pub fn predict(&self, features: &[FeatureVector]) -> Result<Vec<f64>, PricingError> {
        let artifact = self.artifact.as_ref().ok_or(PricingError::UntrainedModel)?;
        if let Some(pos) = features.iter().position(|f| !f.is_finite()) {
            return Err(PricingError::InvalidInput {
                reason: format!("feature vector {} contains non-finite values", pos),
            });
        }

        let scaled = artifact.scaling.transform_all(features);
        Ok(artifact.regressor.predict(&scaled))
    }

    pub fn predict_single(
        &self,
        base_price: f64,
        demand: u32,
        competition_price: f64,
        time_of_day: u8,
        day_of_week: u8,
        season: u8,
    ) -> Result<f64, PricingError> {
        let features = FeatureVector::new(
            base_price,
            demand,
            competition_price,
            time_of_day,
            day_of_week,
            season,
        );
        self.predict_one(&features)
    }

    /// Prices a pipeline record; every feature column must be populated.
    pub fn predict_record(&self, record: &Record) -> Result<f64, PricingError> {
        if !self.is_trained() {
            return Err(PricingError::UntrainedModel);
        }
        let features = FeatureVector::from_record(record)?;
        self.predict_one(&features)
    }

    fn predict_one(&self, features: &FeatureVector) -> Result<f64, PricingError> {
        self.predict(std::slice::from_ref(features))?
            .into_iter()
            .next()
            .ok_or_else(|| PricingError::InvalidInput {
                reason: "no prediction returned".to_string(),
            })
    }

    /// Relative importance per feature name, summing to 1. Empty when untrained.
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        let Some(artifact) = &self.artifact else {
            return BTreeMap::new();
        };

        FEATURE_NAMES
            .iter()
            .zip(artifact.regressor.feature_importances())
            .map(|(name, weight)| (name.to_string(), weight))
            .collect()
    }

    pub fn save(&self) -> Result<(), PricingError> {
        self.save_to(&self.model_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PricingError> {
        let Some(artifact) = &self.artifact else {
            warn!("Model not trained, nothing to save");
            return Err(PricingError::UntrainedModel);
        };

        let file = ModelArtifactFile::new(
            R::KIND,
            artifact.scaling.clone(),
            artifact.metrics.clone(),
            &artifact.regressor,
        );
        write_artifact(path, &file).map_err(|e| {
            error!("Failed to save model: {:#}", e);
            persistence_error(path, e)
        })
    }

    pub fn load(&mut self) -> Result<(), PricingError> {
        let path = self.model_path.clone();
        self.load_from(&path)
    }

    /// Replaces the in-memory artifact only once the file has been fully
    /// decoded and validated.
    pub fn load_from(&mut self, path: &Path) -> Result<(), PricingError> {
        match Self::read_validated(path) {
            Ok(artifact) => {
                self.artifact = Some(artifact);
                info!("Model loaded from {:?}", path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load model: {}", e);
                Err(e)
            }
        }
    }

    fn read_validated(path: &Path) -> Result<TrainedArtifact<R>, PricingError> {
        let file: ModelArtifactFile<R> =
            read_artifact(path, R::KIND).map_err(|e| persistence_error(path, e))?;

        file.scaling
            .validate()
            .and_then(|_| file.regressor.validate())
            .and_then(|_| {
                if file.metrics.is_finite() {
                    Ok(())
                } else {
                    Err("non-finite training metrics".to_string())
                }
            })
            .map_err(|reason| PricingError::Persistence {
                path: path.display().to_string(),
                reason,
            })?;

        Ok(TrainedArtifact {
            regressor: file.regressor,
            scaling: file.scaling,
            metrics: file.metrics,
        })
    }
}

fn persistence_error(path: &Path, e: anyhow::Error) -> PricingError {
    PricingError::Persistence {
        path: path.display().to_string(),
        reason: format!("{:#}", e),
    }
}
