use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A single movie row as it flows through the pipeline. The three
/// enrichment fields stay `None` unless the enricher fills them in;
/// absence is always `None`, never a sentinel string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub genres: String,
    pub year: Option<f64>,
    pub director: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
}

/// Ratings are an opaque pass-through table: the pipeline never inspects
/// the fields, it only relocates them to the sink unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingsTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RatingsTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three optional fields fetched from the metadata service. Values are
/// taken verbatim from the response, including "N/A" placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedFields {
    pub director: Option<String>,
    pub plot: Option<String>,
    pub box_office: Option<String>,
}

/// Outcome of a single successful round-trip to the metadata service.
/// Transport failures surface as `Err` from the lookup itself.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(EnrichedFields),
    NotFound,
}

/// Seam trait for the external metadata service, so tests can substitute
/// a mock without any network.
#[async_trait::async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Look up a movie by its (already year-stripped) title, used verbatim
    /// as the query value.
    async fn lookup(&self, title: &str) -> Result<LookupOutcome>;
}
