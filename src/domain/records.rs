//! Pricing observations as they flow through the data pipeline.
//!
//! Every column is optional so that partially populated rows coming from an
//! external source can be represented; a column counts as present in a record
//! set when at least one record carries a value for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Upper bucket edges for demand levels, right-inclusive: (0,100], (100,300], (300,500], (500,inf)
pub const DEMAND_LEVEL_EDGES: [f64; 4] = [0.0, 100.0, 300.0, 500.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl DemandLevel {
    /// Buckets a demand figure. Zero demand falls outside the first bucket and has no level.
    pub fn from_demand(demand: u32) -> Option<Self> {
        let d = demand as f64;
        if d <= DEMAND_LEVEL_EDGES[0] {
            None
        } else if d <= DEMAND_LEVEL_EDGES[1] {
            Some(DemandLevel::Low)
        } else if d <= DEMAND_LEVEL_EDGES[2] {
            Some(DemandLevel::Medium)
        } else if d <= DEMAND_LEVEL_EDGES[3] {
            Some(DemandLevel::High)
        } else {
            Some(DemandLevel::VeryHigh)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DemandLevel::Low => "low",
            DemandLevel::Medium => "medium",
            DemandLevel::High => "high",
            DemandLevel::VeryHigh => "very_high",
        }
    }
}

/// One pricing observation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub product_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub base_price: Option<f64>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub current_price: Option<f64>,
    pub demand: Option<u32>,
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub competition_price: Option<f64>,
    pub time_of_day: Option<u8>,
    pub day_of_week: Option<u8>,
    pub season: Option<u8>,
    // Derived by the transformer
    #[serde(default, deserialize_with = "finite_or_absent")]
    pub price_ratio: Option<f64>,
    #[serde(default)]
    pub demand_level: Option<DemandLevel>,
}

impl Record {
    /// Structural identity used for exact duplicate detection.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// Drops NaN and infinite prices so they count as missing values.
    pub fn clear_non_finite(&mut self) {
        for slot in [
            &mut self.base_price,
            &mut self.current_price,
            &mut self.competition_price,
            &mut self.price_ratio,
        ] {
            if slot.is_some_and(|v| !v.is_finite()) {
                *slot = None;
            }
        }
    }
}

/// NaN and infinite cells read back as absent values.
fn finite_or_absent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.filter(|v| v.is_finite()))
}

/// Columns of the record schema, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    ProductId,
    Timestamp,
    BasePrice,
    CurrentPrice,
    Demand,
    CompetitionPrice,
    TimeOfDay,
    DayOfWeek,
    Season,
    PriceRatio,
    DemandLevel,
}

impl RecordField {
    /// Columns every raw record is expected to carry.
    pub const SCHEMA: [RecordField; 9] = [
        RecordField::ProductId,
        RecordField::Timestamp,
        RecordField::BasePrice,
        RecordField::CurrentPrice,
        RecordField::Demand,
        RecordField::CompetitionPrice,
        RecordField::TimeOfDay,
        RecordField::DayOfWeek,
        RecordField::Season,
    ];

    /// Columns added by the transformer.
    pub const DERIVED: [RecordField; 2] = [RecordField::PriceRatio, RecordField::DemandLevel];

    pub fn name(&self) -> &'static str {
        match self {
            RecordField::ProductId => "product_id",
            RecordField::Timestamp => "timestamp",
            RecordField::BasePrice => "base_price",
            RecordField::CurrentPrice => "current_price",
            RecordField::Demand => "demand",
            RecordField::CompetitionPrice => "competition_price",
            RecordField::TimeOfDay => "time_of_day",
            RecordField::DayOfWeek => "day_of_week",
            RecordField::Season => "season",
            RecordField::PriceRatio => "price_ratio",
            RecordField::DemandLevel => "demand_level",
        }
    }

    /// Logical column type reported by the validation audit.
    pub fn logical_type(&self) -> &'static str {
        match self {
            RecordField::ProductId => "string",
            RecordField::Timestamp => "datetime",
            RecordField::BasePrice
            | RecordField::CurrentPrice
            | RecordField::CompetitionPrice
            | RecordField::PriceRatio => "float64",
            RecordField::Demand
            | RecordField::TimeOfDay
            | RecordField::DayOfWeek
            | RecordField::Season => "int64",
            RecordField::DemandLevel => "category",
        }
    }

    pub fn is_set(&self, record: &Record) -> bool {
        match self {
            RecordField::ProductId => record.product_id.is_some(),
            RecordField::Timestamp => record.timestamp.is_some(),
            RecordField::BasePrice => record.base_price.is_some_and(f64::is_finite),
            RecordField::CurrentPrice => record.current_price.is_some_and(f64::is_finite),
            RecordField::Demand => record.demand.is_some(),
            RecordField::CompetitionPrice => record.competition_price.is_some_and(f64::is_finite),
            RecordField::TimeOfDay => record.time_of_day.is_some(),
            RecordField::DayOfWeek => record.day_of_week.is_some(),
            RecordField::Season => record.season.is_some(),
            RecordField::PriceRatio => record.price_ratio.is_some_and(f64::is_finite),
            RecordField::DemandLevel => record.demand_level.is_some(),
        }
    }

    /// A column is present when at least one record carries a value for it.
    pub fn present_in(&self, records: &[Record]) -> bool {
        records.iter().any(|r| self.is_set(r))
    }
}
