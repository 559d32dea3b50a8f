use crate::domain::records::Record;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Synthetic pricing history: one base price per product, one record per day.
///
/// Timestamps count back from `anchor`, so a fixed anchor and seed reproduce
/// the exact same record sequence.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    anchor: DateTime<Utc>,
}

impl RecordGenerator {
    /// Anchors the history at the start of the current UTC hour.
    pub fn new() -> Self {
        let now = Utc::now();
        let anchor = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        Self { anchor }
    }

    pub fn with_anchor(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn generate(&self, n_products: usize, days: usize, seed: u64) -> Vec<Record> {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = self.anchor - Duration::days(days as i64);
        let mut records = Vec::with_capacity(n_products * days);

        for product in 1..=n_products {
            let base_price: f64 = rng.random_range(10.0..200.0);

            for day in 0..days {
                let timestamp = start + Duration::days(day as i64);

                let demand: u32 = rng.random_range(50..500);
                let competition_price = base_price * rng.random_range(0.85..1.15);
                let current_price = base_price * rng.random_range(0.9..1.1);

                records.push(Record {
                    product_id: Some(format!("PROD-{:04}", product)),
                    timestamp: Some(timestamp),
                    base_price: Some(round_cents(base_price)),
                    current_price: Some(round_cents(current_price)),
                    demand: Some(demand),
                    competition_price: Some(round_cents(competition_price)),
                    time_of_day: Some(timestamp.hour() as u8),
                    day_of_week: Some(timestamp.weekday().num_days_from_monday() as u8),
                    season: Some(((timestamp.month() - 1) / 3) as u8),
                    price_ratio: None,
                    demand_level: None,
                });
            }
        }

        info!("Generated {} sample records", records.len());
        records
    }
}

impl Default for RecordGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
