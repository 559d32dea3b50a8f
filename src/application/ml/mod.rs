// Regression strategy interface and the forest behind it
pub mod decision_tree;
pub mod predictor;
pub mod random_forest;

// Training data and the pricing model itself
pub mod pricing_model;
pub mod training_data;

pub use pricing_model::{PricingModel, TrainedArtifact, TrainingConfig};
pub use predictor::Regressor;
pub use random_forest::{ForestConfig, RandomForest};
