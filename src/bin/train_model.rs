use anyhow::Context;
use clap::Parser;
use pricewise::application::ml::PricingModel;
use pricewise::application::ml::training_data::synthesize_training_set;
use pricewise::config::PipelineConfig;
use pricewise::domain::ml::{FeatureVector, TrainingReport};
use pricewise::infrastructure::record_csv::read_records_csv;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train and save the pricing model", long_about = None)]
struct Args {
    /// Train on cleaned pipeline records; `current_price` is the label
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where to write the model (defaults to PRICING_MODEL_PATH)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override PRICING_N_TREES
    #[arg(long)]
    n_trees: Option<usize>,

    /// Override PRICING_MAX_DEPTH
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = PipelineConfig::from_env()?;

    let mut forest = config.forest_config();
    if let Some(n_trees) = args.n_trees {
        forest.n_trees = n_trees;
    }
    if let Some(max_depth) = args.max_depth {
        forest.max_depth = max_depth;
    }
    let training = config.training_config();
    let model_path = args.output.unwrap_or_else(|| config.model_path.clone());

    let (features, targets) = match &args.input {
        Some(path) => {
            let records = read_records_csv(path)?;
            let mut features = Vec::with_capacity(records.len());
            let mut targets = Vec::with_capacity(records.len());
            for record in &records {
                let label = record
                    .current_price
                    .with_context(|| format!("{:?} has no current_price", record.product_id))?;
                features.push(FeatureVector::from_record(record)?);
                targets.push(label);
            }
            info!("Training on {} records from {:?}", records.len(), path);
            (features, targets)
        }
        None => synthesize_training_set(training.n_samples, training.seed),
    };

    let mut model: PricingModel = PricingModel::with_config(&model_path, forest, training);
    let result = model.train_on(&features, &targets);
    let report = TrainingReport::from(&result);
    let metrics = result?;
    model.save()?;

    let summary = json!({
        "model_path": model_path,
        "metrics": report,
        "feature_importance": model.feature_importance(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize training summary")?
    );
    info!("Training complete (R² {:.4})", metrics.r2_score);
    Ok(())
}
