use crate::domain::errors::PricingError;
use crate::domain::ml::FeatureVector;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Interface for regression strategies behind the pricing model.
///
/// A fitted regressor is immutable; retraining builds a new one. Implementations
/// must serialize completely so a saved model predicts identically after reload.
pub trait Regressor: Sized + Send + Sync + Clone + Debug + Serialize + DeserializeOwned {
    type Config: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync;

    /// Tag written into model artifacts; loading rejects a mismatching tag.
    const KIND: &'static str;

    fn fit(
        config: &Self::Config,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<Self, PricingError>;

    fn predict(&self, features: &[FeatureVector]) -> Vec<f64>;

    /// Non-negative relative importance per feature, summing to 1.
    fn feature_importances(&self) -> Vec<f64>;

    /// Structural integrity check for a deserialized regressor.
    fn validate(&self) -> Result<(), String>;
}
