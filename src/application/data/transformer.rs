use crate::domain::errors::PipelineError;
use crate::domain::records::{DemandLevel, Record};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashSet;
use tracing::{info, warn};

/// Cleans a record set and adds derived columns.
///
/// Steps: drop exact duplicates, impute numeric gaps with the column median,
/// drop non-positive current prices, derive `price_ratio` and `demand_level`.
#[derive(Debug, Clone, Default)]
pub struct DataTransformer;

impl DataTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Cleans `records`, falling back to an untouched copy of the input if
    /// cleaning fails. The fallback is logged at WARN.
    pub fn transform(&self, records: &[Record]) -> Vec<Record> {
        match self.try_transform(records) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                warn!("Failed to transform data, returning input unchanged: {}", e);
                records.to_vec()
            }
        }
    }

    pub fn try_transform(&self, records: &[Record]) -> Result<Vec<Record>, PipelineError> {
        let mut df = records.to_vec();
        for record in df.iter_mut() {
            record.clear_non_finite();
        }
        let mut df = drop_duplicates(df);

        impute_medians(&mut df);
        // Imputation can make previously distinct rows identical
        df = drop_duplicates(df);

        if df.iter().any(|r| r.current_price.is_some()) {
            df.retain(|r| r.current_price.is_some_and(|p| p > 0.0));
        }

        for record in df.iter_mut() {
            if let (Some(current), Some(base)) = (record.current_price, record.base_price) {
                let ratio = current / base;
                if !ratio.is_finite() {
                    return Err(PipelineError::Transform {
                        reason: format!(
                            "non-finite price_ratio for {} (current={}, base={})",
                            record.product_id.as_deref().unwrap_or("<unknown>"),
                            current,
                            base
                        ),
                    });
                }
                record.price_ratio = Some(ratio);
            }

            if let Some(demand) = record.demand {
                record.demand_level = DemandLevel::from_demand(demand);
            }
        }

        info!("Transformed data: {} records", df.len());
        Ok(df)
    }
}

fn drop_duplicates(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.fingerprint()))
        .collect()
}

fn median(values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = Data::new(values).median();
    m.is_finite().then_some(m)
}

fn column_median<F>(records: &[Record], get: F) -> Option<f64>
where
    F: Fn(&Record) -> Option<f64>,
{
    median(records.iter().filter_map(get).filter(|v| v.is_finite()).collect())
}

/// Fills missing numeric values with the column median. Columns with no
/// values at all stay absent; integer columns take the rounded median.
fn impute_medians(records: &mut [Record]) {
    let base_price = column_median(records, |r| r.base_price);
    let current_price = column_median(records, |r| r.current_price);
    let competition_price = column_median(records, |r| r.competition_price);
    let price_ratio = column_median(records, |r| r.price_ratio);
    let demand = column_median(records, |r| r.demand.map(f64::from));
    let time_of_day = column_median(records, |r| r.time_of_day.map(f64::from));
    let day_of_week = column_median(records, |r| r.day_of_week.map(f64::from));
    let season = column_median(records, |r| r.season.map(f64::from));

    for r in records.iter_mut() {
        fill(&mut r.base_price, base_price);
        fill(&mut r.current_price, current_price);
        fill(&mut r.competition_price, competition_price);
        fill(&mut r.price_ratio, price_ratio);
        fill(&mut r.demand, demand.map(|m| m.round() as u32));
        fill(&mut r.time_of_day, time_of_day.map(|m| m.round() as u8));
        fill(&mut r.day_of_week, day_of_week.map(|m| m.round() as u8));
        fill(&mut r.season, season.map(|m| m.round() as u8));
    }
}

fn fill<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data::generator::RecordGenerator;
    use chrono::{TimeZone, Utc};

    fn sample_records() -> Vec<Record> {
        RecordGenerator::with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
            .generate(5, 4, 42)
    }

    #[test]
    fn test_derives_ratio_and_level() {
        let records = sample_records();
        let transformed = DataTransformer::new().transform(&records);

        assert_eq!(transformed.len(), records.len());
        for r in &transformed {
            let expected = r.current_price.unwrap() / r.base_price.unwrap();
            assert!((r.price_ratio.unwrap() - expected).abs() < 1e-12);
            assert_eq!(r.demand_level, DemandLevel::from_demand(r.demand.unwrap()));
        }
        // Input is left untouched
        assert!(records.iter().all(|r| r.price_ratio.is_none()));
    }

    #[test]
    fn test_drops_duplicates_and_non_positive_prices() {
        let mut records = sample_records();
        records.push(records[0].clone());
        records[1].current_price = Some(0.0);
        records[2].current_price = Some(-3.5);

        let transformed = DataTransformer::new().transform(&records);
        assert_eq!(transformed.len(), 20 - 2);
        assert!(transformed.iter().all(|r| r.current_price.unwrap() > 0.0));
    }

    #[test]
    fn test_imputes_with_median() {
        let mut records: Vec<Record> = [10.0, 20.0, 30.0, 40.0]
            .iter()
            .enumerate()
            .map(|(i, &price)| Record {
                product_id: Some(format!("PROD-{:04}", i)),
                base_price: Some(20.0),
                current_price: Some(price),
                demand: Some(100 * (i as u32 + 1)),
                ..Default::default()
            })
            .collect();
        records[3].current_price = None;
        records[0].demand = None;

        let transformed = DataTransformer::new().transform(&records);
        assert!((transformed[3].current_price.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(transformed[0].demand, Some(300));
        assert_eq!(transformed[0].demand_level, Some(DemandLevel::Medium));
    }

    #[test]
    fn test_absent_column_stays_absent() {
        let records = vec![
            Record {
                product_id: Some("PROD-0001".to_string()),
                current_price: Some(12.0),
                ..Default::default()
            },
            Record {
                product_id: Some("PROD-0002".to_string()),
                current_price: Some(14.0),
                ..Default::default()
            },
        ];

        let transformed = DataTransformer::new().transform(&records);
        assert_eq!(transformed.len(), 2);
        assert!(transformed.iter().all(|r| r.demand.is_none()));
        assert!(transformed.iter().all(|r| r.price_ratio.is_none()));
    }

    #[test]
    fn test_failure_returns_input_unchanged() {
        let mut records = sample_records();
        records[4].base_price = Some(0.0);

        let transformer = DataTransformer::new();
        assert!(matches!(
            transformer.try_transform(&records),
            Err(PipelineError::Transform { .. })
        ));
        assert_eq!(transformer.transform(&records), records);
    }

    #[test]
    fn test_nan_prices_are_imputed() {
        let records: Vec<Record> = [(f64::NAN, 10.0), (f64::NAN, 12.0), (f64::NAN, 11.0), (5.0, 13.0)]
            .iter()
            .enumerate()
            .map(|(i, &(base, current))| Record {
                product_id: Some(format!("PROD-{:04}", i)),
                base_price: Some(base),
                current_price: Some(current),
                ..Default::default()
            })
            .collect();

        let transformed = DataTransformer::new()
            .try_transform(&records)
            .unwrap();
        assert_eq!(transformed.len(), 4);
        assert!(transformed.iter().all(|r| r.base_price == Some(5.0)));
        assert!((transformed[0].price_ratio.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let mut records = sample_records();
        records.push(records[5].clone());
        records[7].competition_price = None;
        records[8].current_price = Some(-1.0);
        records[9].season = None;

        let transformer = DataTransformer::new();
        let once = transformer.transform(&records);
        let twice = transformer.transform(&once);
        assert_eq!(once, twice);
    }
}
