use anyhow::Context;
use clap::Parser;
use pricewise::application::data::DataPipeline;
use pricewise::config::PipelineConfig;
use pricewise::infrastructure::LocalObjectStore;
use pricewise::infrastructure::record_csv::{read_records_csv, write_records_csv};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the pricing data pipeline", long_about = None)]
struct Args {
    /// Read records from this CSV instead of generating them
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the cleaned records to this CSV
    #[arg(long)]
    export: Option<PathBuf>,

    /// Override PIPELINE_N_PRODUCTS
    #[arg(long)]
    products: Option<usize>,

    /// Override PIPELINE_DAYS
    #[arg(long)]
    days: Option<usize>,

    /// Skip the raw-data upload
    #[arg(long)]
    no_upload: bool,
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

    let mut settings = config.pipeline_settings();
    if let Some(products) = args.products {
        settings.n_products = products;
    }
    if let Some(days) = args.days {
        settings.days = days;
    }

    let mut pipeline = DataPipeline::new(settings);
    if config.data_lake_enabled && !args.no_upload {
        match LocalObjectStore::new(&config.data_lake_root) {
            Ok(store) => pipeline = pipeline.with_store(Arc::new(store)),
            Err(e) => warn!("Data lake unavailable, running without upload: {:#}", e),
        }
    }

    let run = match &args.input {
        Some(path) => {
            let records = read_records_csv(path)?;
            pipeline.run_on(records)
        }
        None => pipeline.run(),
    };

    if let Some(path) = &args.export {
        write_records_csv(path, &run.records)?;
    }

    info!("Pipeline finished with status {:?}", run.report.status);
    let report =
        serde_json::to_string_pretty(&run.report).context("Failed to serialize pipeline report")?;
    println!("{}", report);
    Ok(())
}
