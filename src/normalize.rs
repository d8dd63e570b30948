use crate::types::Movie;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

/// Matches a 4-digit year in parentheses at the end of a title, together
/// with any surrounding whitespace, e.g. "Toy Story (1995)".
static YEAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\((\d{4})\)\s*$").expect("year pattern is valid"));

/// Split a raw title into its display form and release year. Titles
/// without a trailing year token come back unchanged with no year, which
/// also makes re-application a no-op.
pub fn normalize_title(raw: &str) -> (String, Option<f64>) {
    match YEAR_SUFFIX.captures(raw) {
        Some(captures) => {
            let year = captures[1].parse::<f64>().ok();
            let stripped = YEAR_SUFFIX.replace(raw, "").trim().to_string();
            (stripped, year)
        }
        None => (raw.trim().to_string(), None),
    }
}

/// Apply title normalization in place across the whole movie table.
/// Per-row, no cross-row state.
#[instrument(skip_all, fields(rows = movies.len()))]
pub fn normalize_titles(movies: &mut [Movie]) {
    let mut derived = 0usize;
    for movie in movies.iter_mut() {
        let (title, year) = normalize_title(&movie.title);
        if year.is_some() {
            derived += 1;
        }
        movie.title = title;
        movie.year = year;
    }
    debug!("Derived a release year for {derived}/{} titles", movies.len());
}
