use crate::config::OmdbConfig;
use crate::error::Result;
use crate::types::{EnrichedFields, LookupOutcome, MetadataLookup, Movie};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OMDb-backed implementation of the metadata lookup seam.
pub struct OmdbClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(config: &OmdbConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl MetadataLookup for OmdbClient {
    async fn lookup(&self, title: &str) -> Result<LookupOutcome> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()
            .await?;
        let data: Value = response.json().await?;
        Ok(parse_omdb_response(&data))
    }
}

/// OMDb signals a match with a literal "True" in the Response field;
/// anything else, including an unexpected shape, is a miss. Field values
/// are taken verbatim ("N/A" included).
fn parse_omdb_response(data: &Value) -> LookupOutcome {
    if data["Response"].as_str() == Some("True") {
        LookupOutcome::Found(EnrichedFields {
            director: data["Director"].as_str().map(|s| s.to_string()),
            plot: data["Plot"].as_str().map(|s| s.to_string()),
            box_office: data["BoxOffice"].as_str().map(|s| s.to_string()),
        })
    } else {
        LookupOutcome::NotFound
    }
}

/// How a single sampled row fared against the metadata service. `NotFound`
/// and `Failed` both collapse to null fields at the merge boundary; the
/// distinction exists only for reporting.
#[derive(Debug, Clone, PartialEq)]
enum RowOutcome {
    Found(EnrichedFields),
    NotFound,
    Failed,
}

/// Aggregate counts from one enrichment run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnrichStats {
    pub sampled: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Enriches a bounded prefix of the movie table from the metadata service,
/// one request at a time, in input order.
pub struct Enricher {
    lookup: Box<dyn MetadataLookup>,
    sample_size: usize,
    batch_pause: Duration,
}

impl Enricher {
    pub fn new(lookup: Box<dyn MetadataLookup>, config: &OmdbConfig) -> Self {
        Self {
            lookup,
            sample_size: config.sample_size,
            batch_pause: Duration::from_millis(config.batch_pause_ms),
        }
    }

    /// Run the full enrichment stage: sample, fetch, pause, merge.
    /// Per-row failures are swallowed into null fields; this stage never
    /// aborts the pipeline.
    #[instrument(skip_all, fields(rows = movies.len(), sample_size = self.sample_size))]
    pub async fn run(&self, movies: &mut [Movie]) -> EnrichStats {
        let outcomes = self.fetch_sampled(movies).await;

        // One flat pause after the whole batch, as a courtesy to the free
        // plan's rate limit. Deliberately not per-request.
        tokio::time::sleep(self.batch_pause).await;

        let stats = EnrichStats {
            sampled: outcomes.len(),
            found: count(&outcomes, |o| matches!(o, RowOutcome::Found(_))),
            not_found: count(&outcomes, |o| matches!(o, RowOutcome::NotFound)),
            failed: count(&outcomes, |o| matches!(o, RowOutcome::Failed)),
        };

        merge_enrichment(movies, &outcomes);
        info!(
            "Enriched {} of {} sampled rows ({} not found, {} failed)",
            stats.found, stats.sampled, stats.not_found, stats.failed
        );
        stats
    }

    /// Issue one lookup per sampled row, synchronously in input order,
    /// keyed by the post-strip title used verbatim.
    async fn fetch_sampled(&self, movies: &[Movie]) -> HashMap<i64, RowOutcome> {
        let mut outcomes = HashMap::new();
        for movie in movies.iter().take(self.sample_size) {
            let outcome = match self.lookup.lookup(&movie.title).await {
                Ok(LookupOutcome::Found(fields)) => RowOutcome::Found(fields),
                Ok(LookupOutcome::NotFound) => RowOutcome::NotFound,
                Err(e) => {
                    debug!("Lookup failed for movieId {}: {}", movie.movie_id, e);
                    RowOutcome::Failed
                }
            };
            outcomes.insert(movie.movie_id, outcome);
        }
        outcomes
    }
}

fn count(outcomes: &HashMap<i64, RowOutcome>, pred: impl Fn(&RowOutcome) -> bool) -> usize {
    outcomes.values().filter(|o| pred(o)).count()
}

/// Left-join the fetched fields back into the full table by movieId.
/// Sampled rows gain their values; everything else stays null. Rows are
/// never dropped or duplicated.
fn merge_enrichment(movies: &mut [Movie], outcomes: &HashMap<i64, RowOutcome>) {
    for movie in movies.iter_mut() {
        match outcomes.get(&movie.movie_id) {
            Some(RowOutcome::Found(fields)) => {
                movie.director = fields.director.clone();
                movie.plot = fields.plot.clone();
                movie.box_office = fields.box_office.clone();
            }
            Some(RowOutcome::NotFound) | Some(RowOutcome::Failed) | None => {
                movie.director = None;
                movie.plot = None;
                movie.box_office = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use std::sync::{Arc, Mutex};

    /// Mock lookup that scripts one response per title.
    struct MockLookup {
        responses: HashMap<String, Result<LookupOutcome>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockLookup {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Arc<Mutex<Vec<String>>> {
            self.calls.clone()
        }

        fn found(mut self, title: &str, director: &str) -> Self {
            self.responses.insert(
                title.to_string(),
                Ok(LookupOutcome::Found(EnrichedFields {
                    director: Some(director.to_string()),
                    plot: Some("A plot.".to_string()),
                    box_office: Some("$1".to_string()),
                })),
            );
            self
        }

        fn not_found(mut self, title: &str) -> Self {
            self.responses
                .insert(title.to_string(), Ok(LookupOutcome::NotFound));
            self
        }

        fn failing(mut self, title: &str) -> Self {
            self.responses.insert(
                title.to_string(),
                Err(EtlError::Config(format!("simulated timeout for {title}"))),
            );
            self
        }
    }

    #[async_trait::async_trait]
    impl MetadataLookup for MockLookup {
        async fn lookup(&self, title: &str) -> Result<LookupOutcome> {
            self.calls.lock().unwrap().push(title.to_string());
            match self.responses.get(title) {
                Some(Ok(outcome)) => Ok(outcome.clone()),
                Some(Err(_)) => Err(EtlError::Config("simulated failure".to_string())),
                None => Ok(LookupOutcome::NotFound),
            }
        }
    }

    fn movie(movie_id: i64, title: &str) -> Movie {
        Movie {
            movie_id,
            title: title.to_string(),
            genres: String::new(),
            year: None,
            director: None,
            plot: None,
            box_office: None,
        }
    }

    fn config(sample_size: usize) -> OmdbConfig {
        OmdbConfig {
            sample_size,
            batch_pause_ms: 0,
            ..OmdbConfig::default()
        }
    }

    #[test]
    fn parses_a_successful_omdb_payload() {
        let data = serde_json::json!({
            "Title": "Toy Story",
            "Response": "True",
            "Director": "John Lasseter",
            "Plot": "A cowboy doll is profoundly threatened.",
            "BoxOffice": "$223,225,679"
        });
        assert_eq!(
            parse_omdb_response(&data),
            LookupOutcome::Found(EnrichedFields {
                director: Some("John Lasseter".to_string()),
                plot: Some("A cowboy doll is profoundly threatened.".to_string()),
                box_office: Some("$223,225,679".to_string()),
            })
        );
    }

    #[test]
    fn missing_fields_stay_absent_on_a_match() {
        let data = serde_json::json!({ "Response": "True", "Director": "Someone" });
        let LookupOutcome::Found(fields) = parse_omdb_response(&data) else {
            panic!("expected a match");
        };
        assert_eq!(fields.director.as_deref(), Some("Someone"));
        assert_eq!(fields.plot, None);
        assert_eq!(fields.box_office, None);
    }

    #[test]
    fn na_placeholders_are_kept_verbatim() {
        let data = serde_json::json!({ "Response": "True", "BoxOffice": "N/A" });
        let LookupOutcome::Found(fields) = parse_omdb_response(&data) else {
            panic!("expected a match");
        };
        assert_eq!(fields.box_office.as_deref(), Some("N/A"));
    }

    #[test]
    fn anything_but_true_is_a_miss() {
        let miss = serde_json::json!({ "Response": "False", "Error": "Movie not found!" });
        assert_eq!(parse_omdb_response(&miss), LookupOutcome::NotFound);

        let unexpected = serde_json::json!({ "weird": [1, 2, 3] });
        assert_eq!(parse_omdb_response(&unexpected), LookupOutcome::NotFound);

        assert_eq!(
            parse_omdb_response(&serde_json::Value::Null),
            LookupOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn fills_fields_for_matched_rows() {
        let lookup = MockLookup::new().found("Toy Story", "John Lasseter");
        let enricher = Enricher::new(Box::new(lookup), &config(50));

        let mut movies = vec![movie(1, "Toy Story")];
        let stats = enricher.run(&mut movies).await;

        assert_eq!(stats.found, 1);
        assert_eq!(movies[0].director.as_deref(), Some("John Lasseter"));
        assert_eq!(movies[0].plot.as_deref(), Some("A plot."));
        assert_eq!(movies[0].box_office.as_deref(), Some("$1"));
    }

    #[tokio::test]
    async fn rows_beyond_sample_cutoff_stay_null() {
        let mut lookup = MockLookup::new();
        for i in 0..60 {
            lookup = lookup.found(&format!("Movie {i}"), "Someone");
        }
        let enricher = Enricher::new(Box::new(lookup), &config(50));

        let mut movies: Vec<Movie> = (0..60)
            .map(|i| movie(i + 1, &format!("Movie {i}")))
            .collect();
        let stats = enricher.run(&mut movies).await;

        assert_eq!(stats.sampled, 50);
        assert_eq!(movies[49].director.as_deref(), Some("Someone"));
        assert_eq!(movies[50].director, None);
        assert_eq!(movies[59].plot, None);
        assert_eq!(movies[59].box_office, None);
    }

    #[tokio::test]
    async fn lookup_failure_is_swallowed_and_later_rows_continue() {
        let lookup = MockLookup::new()
            .failing("Broken")
            .found("Fine", "Someone");
        let enricher = Enricher::new(Box::new(lookup), &config(50));

        let mut movies = vec![movie(1, "Broken"), movie(2, "Fine")];
        let stats = enricher.run(&mut movies).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.found, 1);
        assert_eq!(movies[0].director, None);
        assert_eq!(movies[0].plot, None);
        assert_eq!(movies[0].box_office, None);
        assert_eq!(movies[1].director.as_deref(), Some("Someone"));
    }

    #[tokio::test]
    async fn not_found_rows_get_null_fields() {
        let lookup = MockLookup::new().not_found("Obscure Film");
        let enricher = Enricher::new(Box::new(lookup), &config(50));

        let mut movies = vec![movie(7, "Obscure Film")];
        let stats = enricher.run(&mut movies).await;

        assert_eq!(stats.not_found, 1);
        assert_eq!(movies[0].director, None);
    }

    #[tokio::test]
    async fn merge_preserves_every_row_exactly_once() {
        let lookup = MockLookup::new().found("A", "D");
        let enricher = Enricher::new(Box::new(lookup), &config(2));

        let mut movies = vec![movie(1, "A"), movie(2, "B"), movie(3, "C")];
        enricher.run(&mut movies).await;

        assert_eq!(movies.len(), 3);
        let ids: Vec<i64> = movies.iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn requests_follow_input_order() {
        let lookup = MockLookup::new();
        let calls = lookup.calls();
        let enricher = Enricher::new(Box::new(lookup), &config(3));

        let mut movies = vec![movie(1, "First"), movie(2, "Second"), movie(3, "Third")];
        enricher.run(&mut movies).await;

        assert_eq!(*calls.lock().unwrap(), vec!["First", "Second", "Third"]);
    }
}
