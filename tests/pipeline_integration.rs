use chrono::{TimeZone, Utc};
use pricewise::application::data::{
    DataPipeline, DataTransformer, DataValidator, MetricsAggregator, PipelineSettings,
    RecordGenerator, RunStatus,
};
use pricewise::application::ml::{ForestConfig, PricingModel, TrainingConfig};
use pricewise::domain::ml::FeatureVector;
use pricewise::domain::ports::ObjectStore;
use pricewise::domain::records::Record;
use pricewise::infrastructure::LocalObjectStore;
use pricewise::infrastructure::record_csv::{read_records_csv, write_records_csv};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

fn generator() -> RecordGenerator {
    RecordGenerator::with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
}

fn messy_records() -> Vec<Record> {
    let mut records = generator().generate(6, 4, 3);
    records.push(records[0].clone());
    records.push(records[5].clone());
    records[2].demand = None;
    records[3].competition_price = None;
    records[7].current_price = Some(-4.0);
    records[9].current_price = Some(0.0);
    records[11].base_price = None;
    records
}

#[test]
fn test_generation_is_deterministic() {
    let first = generator().generate(10, 5, 42);
    let second = generator().generate(10, 5, 42);

    assert_eq!(first.len(), 50);
    assert_eq!(first, second);
    assert_ne!(first, generator().generate(10, 5, 43));
}

#[test]
fn test_validation_counts_add_up() {
    let records = messy_records();
    let report = DataValidator::new().validate(&records);

    let distinct: HashSet<String> = records.iter().map(|r| r.fingerprint()).collect();
    assert_eq!(report.total_records, records.len());
    assert_eq!(report.duplicate_records + distinct.len(), report.total_records);
    assert_eq!(report.duplicate_records, 2);
    assert_eq!(report.negative_prices, Some(1));
    assert_eq!(report.missing_values["demand"], 1);
    assert_eq!(report.missing_values["base_price"], 1);
}

#[test]
fn test_transform_twice_equals_once() {
    let transformer = DataTransformer::new();
    let once = transformer.transform(&messy_records());
    let twice = transformer.transform(&once);

    assert_eq!(once, twice);
    assert!(once.iter().all(|r| r.current_price.is_some_and(|p| p > 0.0)));
    assert!(once.iter().all(|r| r.demand.is_some() && r.base_price.is_some()));

    let report = DataValidator::new().validate(&once);
    assert_eq!(report.duplicate_records, 0);
    assert!(report.missing_values.values().all(|&n| n == 0));
}

#[test]
fn test_aggregate_after_cleaning() {
    let cleaned = DataTransformer::new().transform(&messy_records());
    let metrics = MetricsAggregator::new().aggregate(&cleaned);

    assert_eq!(metrics.total_products, 6);
    assert_eq!(metrics.total_records, cleaned.len());
    let stats = metrics.price_stats.unwrap();
    assert!(stats.min > 0.0 && stats.min <= stats.median && stats.median <= stats.max);
    assert!(metrics.date_range.start < metrics.date_range.end);
}

#[test]
fn test_pipeline_run_uploads_to_local_lake() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalObjectStore::new(dir.path().join("lake")).unwrap());

    let mut pipeline = DataPipeline::new(PipelineSettings {
        n_products: 5,
        days: 4,
        seed: 42,
    })
    .with_generator(generator())
    .with_store(store.clone());

    let run = pipeline.run();
    assert_eq!(run.report.status, RunStatus::Success);
    assert_eq!(run.report.records_processed, 20);

    let keys = store.list("raw_data/").unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(Some(&keys[0]), run.report.raw_data_key.as_ref());
}

#[test]
fn test_csv_export_feeds_model_training() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("clean.csv");

    let mut pipeline = DataPipeline::new(PipelineSettings {
        n_products: 40,
        days: 10,
        seed: 5,
    })
    .with_generator(generator());
    let run = pipeline.run();
    write_records_csv(&csv_path, &run.records).unwrap();

    let records = read_records_csv(&csv_path).unwrap();
    assert_eq!(records.len(), run.records.len());

    let features: Vec<FeatureVector> = records
        .iter()
        .map(|r| FeatureVector::from_record(r).unwrap())
        .collect();
    let targets: Vec<f64> = records.iter().map(|r| r.current_price.unwrap()).collect();

    let mut model: PricingModel = PricingModel::with_config(
        dir.path().join("model.json"),
        ForestConfig {
            n_trees: 15,
            max_depth: 6,
            ..Default::default()
        },
        TrainingConfig::default(),
    );
    let metrics = model.train_on(&features, &targets).unwrap();
    assert!(metrics.r2_score > 0.8, "r2 = {}", metrics.r2_score);

    let price = model.predict_record(&records[0]).unwrap();
    let base = records[0].base_price.unwrap();
    assert!(price > base * 0.5 && price < base * 1.5);
}

#[test]
fn test_nan_cells_are_cleaned_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    fs::write(
        &path,
        "product_id,base_price,current_price\nA,NaN,10.0\nB,NaN,12.0\nC,NaN,11.0\nD,5.0,13.0\n",
    )
    .unwrap();
    let records = read_records_csv(&path).unwrap();

    let report = DataValidator::new().validate(&records);
    assert_eq!(report.missing_values["base_price"], 3);
    assert_eq!(report.missing_values["current_price"], 0);

    let cleaned = DataTransformer::new().try_transform(&records).unwrap();
    assert_eq!(cleaned.len(), 4);
    assert!(cleaned.iter().all(|r| r.base_price == Some(5.0)));
    assert!(cleaned.iter().all(|r| r.price_ratio.is_some_and(f64::is_finite)));

    let metrics = MetricsAggregator::new().aggregate(&cleaned);
    assert!((metrics.avg_price - 11.5).abs() < 1e-12);
}
