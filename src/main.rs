use clap::Parser;
use tracing::{error, info};

use movie_etl::config::Config;
use movie_etl::enrich::OmdbClient;
use movie_etl::logging;
use movie_etl::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "movie_etl")]
#[command(about = "Movie catalog ETL: CSV inputs, OMDb enrichment, SQLite output")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml if present)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // The credential check happens before any file or network I/O.
    let api_key = Config::omdb_api_key()?;
    let client = OmdbClient::new(&config.omdb, api_key)?;

    match Pipeline::run(&config, Box::new(client)).await {
        Ok(summary) => {
            info!(
                "Run summary: {} movies, {} ratings, {}/{} sampled rows enriched",
                summary.movies_loaded,
                summary.ratings_loaded,
                summary.enrich.found,
                summary.enrich.sampled
            );
            println!("\n📊 Run summary:");
            println!("   Movies loaded: {}", summary.movies_loaded);
            println!("   Ratings loaded: {}", summary.ratings_loaded);
            println!("   Sampled for enrichment: {}", summary.enrich.sampled);
            println!("   Enriched: {}", summary.enrich.found);
            println!("   Not found: {}", summary.enrich.not_found);
            println!("   Failed: {}", summary.enrich.failed);
            Ok(())
        }
        Err(e) => {
            error!("ETL run failed: {}", e);
            println!("❌ ETL run failed: {e}");
            Err(e.into())
        }
    }
}
