use super::aggregator::{AggregateMetrics, MetricsAggregator};
use super::generator::RecordGenerator;
use super::transformer::DataTransformer;
use super::validator::{DataValidator, ValidationReport};
use crate::domain::errors::PipelineError;
use crate::domain::ports::ObjectStore;
use crate::domain::records::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub const RAW_DATA_PREFIX: &str = "raw_data/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub n_products: usize,
    pub days: usize,
    pub seed: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            n_products: 100,
            days: 30,
            seed: 42,
        }
    }
}

/// Outcome of handing raw records to the object store.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestStatus {
    Stored { key: String },
    /// No store configured
    Skipped,
    Failed { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    /// The run finished but an upload failed or cleaning fell back to raw data
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunReport {
    pub status: RunStatus,
    pub records_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data_key: Option<String>,
    pub validation: ValidationReport,
    pub metrics: AggregateMetrics,
    pub transform_fallback: bool,
    pub completed_at: DateTime<Utc>,
}

/// Report plus the cleaned records it describes.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: PipelineRunReport,
    pub records: Vec<Record>,
}

/// Batch pipeline: generate, ingest, validate, transform, aggregate.
pub struct DataPipeline {
    settings: PipelineSettings,
    generator: RecordGenerator,
    validator: DataValidator,
    transformer: DataTransformer,
    aggregator: MetricsAggregator,
    store: Option<Arc<dyn ObjectStore>>,
    processed_records: usize,
}

impl DataPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            generator: RecordGenerator::new(),
            validator: DataValidator::new(),
            transformer: DataTransformer::new(),
            aggregator: MetricsAggregator::new(),
            store: None,
            processed_records: 0,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_generator(mut self, generator: RecordGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Records ingested over the lifetime of this pipeline.
    pub fn processed_records(&self) -> usize {
        self.processed_records
    }

    /// Counts the records and uploads them under a timestamped raw-data key
    /// when a store is configured. Upload failures are logged, not raised.
    pub fn ingest(&mut self, records: &[Record]) -> IngestStatus {
        self.processed_records += records.len();
        info!("Ingested {} records", records.len());

        let Some(store) = &self.store else {
            return IngestStatus::Skipped;
        };

        let key = raw_data_key(Utc::now());
        match upload(store.as_ref(), &key, records) {
            Ok(()) => {
                info!("Uploaded raw data to {}", key);
                IngestStatus::Stored { key }
            }
            Err(e) => {
                warn!("Failed to upload raw data, continuing without it: {}", e);
                IngestStatus::Failed {
                    key,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Runs the full pipeline over freshly generated records.
    pub fn run(&mut self) -> PipelineRun {
        let records = self.generator.generate(
            self.settings.n_products,
            self.settings.days,
            self.settings.seed,
        );
        self.run_on(records)
    }

    /// Runs ingest, validation, cleaning and aggregation over `records`.
    pub fn run_on(&mut self, records: Vec<Record>) -> PipelineRun {
        info!("Starting data pipeline over {} records", records.len());

        let ingest = self.ingest(&records);
        let validation = self.validator.validate(&records);

        let (cleaned, transform_fallback) = match self.transformer.try_transform(&records) {
            Ok(cleaned) => (cleaned, false),
            Err(e) => {
                warn!("Failed to transform data, continuing with raw records: {}", e);
                (records, true)
            }
        };

        let metrics = self.aggregator.aggregate(&cleaned);

        let (status, raw_data_key) = match ingest {
            IngestStatus::Stored { key } => (RunStatus::Success, Some(key)),
            IngestStatus::Skipped => (RunStatus::Success, None),
            IngestStatus::Failed { .. } => (RunStatus::Partial, None),
        };
        let status = if transform_fallback {
            RunStatus::Partial
        } else {
            status
        };

        info!(
            "Data pipeline completed: {} records processed, {} after cleaning",
            self.processed_records,
            cleaned.len()
        );

        PipelineRun {
            report: PipelineRunReport {
                status,
                records_processed: self.processed_records,
                raw_data_key,
                validation,
                metrics,
                transform_fallback,
                completed_at: Utc::now(),
            },
            records: cleaned,
        }
    }
}

pub fn raw_data_key(at: DateTime<Utc>) -> String {
    format!(
        "{}pricing_data_{}.json",
        RAW_DATA_PREFIX,
        at.format("%Y%m%d_%H%M%S")
    )
}

fn upload(store: &dyn ObjectStore, key: &str, records: &[Record]) -> Result<(), PipelineError> {
    let payload = json!({ "data": records });
    store.put(key, &payload).map_err(|e| PipelineError::Storage {
        key: key.to_string(),
        reason: format!("{:#}", e),
    })
}
