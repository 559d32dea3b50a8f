use crate::domain::records::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Sample standard deviation; 0 with fewer than two prices
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Summary statistics of a record set, computed fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_products: usize,
    pub avg_price: f64,
    pub avg_demand: f64,
    pub total_records: usize,
    pub date_range: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_stats: Option<PriceStats>,
    pub aggregated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, records: &[Record]) -> AggregateMetrics {
        let total_products = records
            .iter()
            .filter_map(|r| r.product_id.as_deref())
            .collect::<HashSet<_>>()
            .len();

        let prices: Vec<f64> = records
            .iter()
            .filter_map(|r| r.current_price)
            .filter(|p| p.is_finite())
            .collect();
        let demand: Vec<f64> = records
            .iter()
            .filter_map(|r| r.demand.map(f64::from))
            .collect();

        let timestamps = records.iter().filter_map(|r| r.timestamp);
        let date_range = DateRange {
            start: Iterator::min(timestamps.clone()),
            end: Iterator::max(timestamps),
        };

        let metrics = AggregateMetrics {
            total_products,
            avg_price: mean_or_zero(&prices),
            avg_demand: mean_or_zero(&demand),
            total_records: records.len(),
            date_range,
            price_stats: price_stats(&prices),
            aggregated_at: Utc::now(),
        };

        info!(
            "Metrics aggregated: {} products over {} records",
            metrics.total_products, metrics.total_records
        );
        metrics
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    }
}

fn price_stats(prices: &[f64]) -> Option<PriceStats> {
    if prices.is_empty() {
        return None;
    }

    let std = if prices.len() > 1 {
        prices.iter().std_dev()
    } else {
        0.0
    };

    Some(PriceStats {
        min: Statistics::min(prices.iter()),
        max: Statistics::max(prices.iter()),
        median: Data::new(prices.to_vec()).median(),
        std,
    })
}
