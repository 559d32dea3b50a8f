pub mod feature_registry;
pub mod metrics;
pub mod scaling;

pub use feature_registry::{FEATURE_NAMES, FeatureVector, NUM_FEATURES};
pub use metrics::{TrainingMetrics, TrainingReport};
pub use scaling::ScalingParameters;
