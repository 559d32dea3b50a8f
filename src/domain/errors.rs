use thiserror::Error;

/// Errors raised by the pricing model and its feature handling
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Required field missing: {field}")]
    Schema { field: String },

    #[error("Model must be trained before prediction")]
    UntrainedModel,

    #[error("Training failed: {reason}")]
    TrainingFailure { reason: String },

    #[error("Model artifact error at {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl PricingError {
    pub fn training(reason: impl Into<String>) -> Self {
        PricingError::TrainingFailure {
            reason: reason.into(),
        }
    }

    pub fn schema(field: impl Into<String>) -> Self {
        PricingError::Schema {
            field: field.into(),
        }
    }
}

/// Errors related to data cleaning and ingestion
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transform failed: {reason}")]
    Transform { reason: String },

    #[error("Object store write failed for {key}: {reason}")]
    Storage { key: String, reason: String },
}
