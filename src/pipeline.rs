use crate::config::Config;
use crate::enrich::{EnrichStats, Enricher};
use crate::error::Result;
use crate::loader;
use crate::normalize;
use crate::sink::SqliteSink;
use crate::types::MetadataLookup;
use tracing::{info, instrument};

/// Result of a complete pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub movies_loaded: usize,
    pub ratings_loaded: usize,
    pub enrich: EnrichStats,
}

pub struct Pipeline;

impl Pipeline {
    /// Run the whole pipeline top to bottom: load, normalize, enrich,
    /// persist. Each stage consumes the full output of the previous one;
    /// any fatal stage error aborts the run before anything is persisted.
    #[instrument(skip_all)]
    pub async fn run(config: &Config, lookup: Box<dyn MetadataLookup>) -> Result<RunSummary> {
        info!("Starting ETL run");

        println!("🔹 Reading CSV files...");
        let mut movies = loader::load_movies(&config.inputs.movies_csv)?;
        let ratings = loader::load_ratings(&config.inputs.ratings_csv)?;
        info!(
            "Loaded {} movies and {} ratings",
            movies.len(),
            ratings.len()
        );

        println!("🔹 Cleaning and processing data...");
        normalize::normalize_titles(&mut movies);

        println!("🔹 Fetching additional movie data from OMDb API...");
        let enricher = Enricher::new(lookup, &config.omdb);
        let enrich = enricher.run(&mut movies).await;

        println!("🔹 Loading data into database...");
        let mut sink = SqliteSink::open(&config.database.path)?;
        sink.write_movies(&movies)?;
        sink.write_ratings(&ratings)?;

        println!("✅ ETL process completed successfully!");
        info!("ETL run finished");

        Ok(RunSummary {
            movies_loaded: movies.len(),
            ratings_loaded: ratings.len(),
            enrich,
        })
    }
}
