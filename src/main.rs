use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;

use kuyy_scraper::config::AppConfig;
use kuyy_scraper::constants;
use kuyy_scraper::events_api::HttpEventsApi;
use kuyy_scraper::export::to_csv;
use kuyy_scraper::geocode::NominatimGeocoder;
use kuyy_scraper::input::QueryInput;
use kuyy_scraper::logging;
use kuyy_scraper::pipeline::Pipeline;
use kuyy_scraper::storage::{Dataset, FsDataset, FsKeyValueStore, KeyValueStore};

#[derive(Parser)]
#[command(name = "kuyy_scraper")]
#[command(about = "Kuyy activity-event harvester")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one harvest against the Kuyy events feed
    Harvest {
        /// Path to a JSON input file (actor-style INPUT); flags override it
        #[arg(long)]
        input: Option<PathBuf>,
        /// Province the target city is in
        #[arg(long)]
        province: Option<String>,
        /// City to center the search on
        #[arg(long)]
        city: Option<String>,
        /// Activity to harvest (see the activities command)
        #[arg(long)]
        activity: Option<String>,
        /// How many days from today to include
        #[arg(long)]
        days_range: Option<u32>,
        /// Stop after this many accepted records
        #[arg(long)]
        max_items: Option<usize>,
        /// Search radius in kilometres
        #[arg(long)]
        distance: Option<f64>,
        /// Page size requested from the API
        #[arg(long)]
        limit_per_page: Option<u32>,
        /// Events API base URL
        #[arg(long)]
        base_api_url: Option<String>,
    },
    /// List the supported activity keys
    Activities,
}

/// Start from the JSON input file when given, defaults otherwise; CLI flags
/// are layered on top by the caller.
fn load_input(path: Option<&Path>) -> anyhow::Result<QueryInput> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(QueryInput::default()),
    }
}

/// Read the accumulated records back and store them as CSV next to the
/// other run artifacts. Skipped when the run accepted nothing.
async fn export_csv(dataset: &dyn Dataset, key_value: &dyn KeyValueStore) -> anyhow::Result<()> {
    let items = dataset.items().await?;
    if items.is_empty() {
        return Ok(());
    }
    let csv = to_csv(&items);
    key_value.set_text("RESULT.csv", &csv).await?;
    println!("💾 Exported {} records to RESULT.csv", items.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Activities => {
            println!("Supported activities:");
            for key in constants::supported_activities() {
                println!("  {key}");
            }
        }
        Commands::Harvest {
            input,
            province,
            city,
            activity,
            days_range,
            max_items,
            distance,
            limit_per_page,
            base_api_url,
        } => {
            let config = AppConfig::load()?;

            let mut query = load_input(input.as_deref())?;
            if let Some(value) = province {
                query.province = value;
            }
            if let Some(value) = city {
                query.city = value;
            }
            if let Some(value) = activity {
                query.activity = value;
            }
            if let Some(value) = days_range {
                query.days_range = value;
            }
            if let Some(value) = max_items {
                query.max_items = value;
            }
            if let Some(value) = distance {
                query.distance = value;
            }
            if let Some(value) = limit_per_page {
                query.limit_per_page = value;
            }
            if let Some(value) = base_api_url {
                query.base_api_url = value;
            }

            let dataset = Arc::new(FsDataset::new(Path::new(&config.storage.dataset_dir))?);
            let key_value = Arc::new(FsKeyValueStore::new(Path::new(
                &config.storage.key_value_dir,
            ))?);
            let geocoder = Arc::new(NominatimGeocoder::new(
                config.http.geocode_url.clone(),
                config.http.user_agent.clone(),
                config.request_timeout(),
            ));
            let api = Arc::new(HttpEventsApi::new(config.request_timeout()));

            let pipeline = Pipeline::new(api, geocoder, dataset.clone(), key_value.clone());

            match pipeline.run(&query).await {
                Ok(result) => {
                    println!("\n📊 Harvest results:");
                    println!("   Run id: {}", result.run_id);
                    println!("   Pages fetched: {}", result.pages_fetched);
                    println!("   Records accepted: {}", result.total_accepted);
                    println!("   Stopped because: {:?}", result.stop_reason);

                    export_csv(dataset.as_ref(), key_value.as_ref()).await?;
                }
                Err(e) => {
                    error!("Harvest failed: {}", e);
                    println!("❌ Harvest failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
