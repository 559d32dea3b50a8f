use crate::domain::errors::PricingError;
use crate::domain::records::Record;
use serde::{Deserialize, Serialize};

pub const NUM_FEATURES: usize = 6;

/// Ordered list of feature names.
/// Scaling parameters and tree splits are indexed by position in this list,
/// so any change here is a breaking change for persisted models.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "base_price",
    "demand",
    "competition_price",
    "time_of_day",
    "day_of_week",
    "season",
];

/// Numeric projection of a pricing context, in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn new(
        base_price: f64,
        demand: u32,
        competition_price: f64,
        time_of_day: u8,
        day_of_week: u8,
        season: u8,
    ) -> Self {
        Self([
            base_price,
            demand as f64,
            competition_price,
            time_of_day as f64,
            day_of_week as f64,
            season as f64,
        ])
    }

    /// Projects a record onto the model's features.
    /// Every feature column is required; the first absent one is reported.
    pub fn from_record(record: &Record) -> Result<Self, PricingError> {
        let base_price = record
            .base_price
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[0]))?;
        let demand = record
            .demand
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[1]))?;
        let competition_price = record
            .competition_price
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[2]))?;
        let time_of_day = record
            .time_of_day
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[3]))?;
        let day_of_week = record
            .day_of_week
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[4]))?;
        let season = record
            .season
            .ok_or_else(|| PricingError::schema(FEATURE_NAMES[5]))?;

        Ok(Self::new(
            base_price,
            demand,
            competition_price,
            time_of_day,
            day_of_week,
            season,
        ))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}
