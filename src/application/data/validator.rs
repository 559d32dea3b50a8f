use crate::domain::records::{Record, RecordField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Tukey fence multiplier for demand outliers
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Read-only data quality snapshot.
///
/// `negative_prices` and `demand_outliers` are only reported when the source
/// column is present in the record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub missing_values: BTreeMap<String, usize>,
    pub duplicate_records: usize,
    pub data_types: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_outliers: Option<usize>,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct DataValidator;

impl DataValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, records: &[Record]) -> ValidationReport {
        let mut missing_values = BTreeMap::new();
        let mut data_types = BTreeMap::new();

        for field in RecordField::SCHEMA.iter().chain(RecordField::DERIVED.iter()) {
            let present = field.present_in(records);
            let is_schema_field = RecordField::SCHEMA.contains(field);
            if is_schema_field || present {
                let missing = records.iter().filter(|r| !field.is_set(r)).count();
                missing_values.insert(field.name().to_string(), missing);
            }
            if present {
                data_types.insert(field.name().to_string(), field.logical_type().to_string());
            }
        }

        let negative_prices = RecordField::CurrentPrice.present_in(records).then(|| {
            records
                .iter()
                .filter(|r| r.current_price.is_some_and(|p| p < 0.0))
                .count()
        });

        let demand_outliers = RecordField::Demand
            .present_in(records)
            .then(|| count_demand_outliers(records));

        let report = ValidationReport {
            total_records: records.len(),
            missing_values,
            duplicate_records: count_duplicates(records),
            data_types,
            negative_prices,
            demand_outliers,
            validated_at: Utc::now(),
        };

        info!(
            "Data validation completed: {} records, {} duplicates",
            report.total_records, report.duplicate_records
        );
        report
    }
}

/// Records structurally identical to an earlier record in the sequence.
pub fn count_duplicates(records: &[Record]) -> usize {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !seen.insert(r.fingerprint()))
        .count()
}

/// Demand values outside [Q1 - 1.5 IQR, Q3 + 1.5 IQR].
fn count_demand_outliers(records: &[Record]) -> usize {
    let mut demand: Vec<f64> = records
        .iter()
        .filter_map(|r| r.demand.map(|d| d as f64))
        .collect();
    if demand.is_empty() {
        return 0;
    }
    demand.sort_by(f64::total_cmp);

    let q1 = linear_quantile(&demand, 0.25);
    let q3 = linear_quantile(&demand, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - IQR_MULTIPLIER * iqr;
    let upper = q3 + IQR_MULTIPLIER * iqr;

    demand.iter().filter(|&&d| d < lower || d > upper).count()
}

/// Quantile of sorted, non-empty data, interpolating linearly between the
/// two closest ranks at `(n - 1) * p`.
fn linear_quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
