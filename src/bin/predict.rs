use clap::Parser;
use pricewise::application::ml::PricingModel;
use pricewise::config::PipelineConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Price one context with a saved model", long_about = None)]
struct Args {
    /// Model file (defaults to PRICING_MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long)]
    base_price: f64,

    #[arg(long)]
    demand: u32,

    #[arg(long)]
    competition_price: f64,

    /// Hour of day, 0-23
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..24))]
    time_of_day: u8,

    /// Monday = 0
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..7))]
    day_of_week: u8,

    /// 0 = Jan-Mar ... 3 = Oct-Dec
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..4))]
    season: u8,
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
    let model_path = args.model.unwrap_or(config.model_path);

    let mut model = PricingModel::new(model_path);
    model.load()?;

    let price = model.predict_single(
        args.base_price,
        args.demand,
        args.competition_price,
        args.time_of_day,
        args.day_of_week,
        args.season,
    )?;
    println!("{:.2}", price);
    Ok(())
}
