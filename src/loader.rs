use crate::error::Result;
use crate::types::{Movie, RatingsTable};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Shape of one row in the movies CSV input.
#[derive(Debug, Deserialize)]
struct MovieCsvRow {
    #[serde(rename = "movieId")]
    movie_id: i64,
    title: String,
    genres: String,
}

/// Read the movies CSV into typed rows. Any missing, unreadable, or
/// malformed input is fatal; there is no partial load.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_movies<P: AsRef<Path>>(path: P) -> Result<Vec<Movie>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut movies = Vec::new();
    for record in reader.deserialize() {
        let row: MovieCsvRow = record?;
        movies.push(Movie {
            movie_id: row.movie_id,
            title: row.title,
            genres: row.genres,
            year: None,
            director: None,
            plot: None,
            box_office: None,
        });
    }
    info!("Loaded {} movie rows", movies.len());
    Ok(movies)
}

/// Read the ratings CSV without interpreting it: headers and rows are kept
/// as strings and handed to the sink unchanged.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_ratings<P: AsRef<Path>>(path: P) -> Result<RatingsTable> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    info!("Loaded {} rating rows", rows.len());
    Ok(RatingsTable { headers, rows })
}
