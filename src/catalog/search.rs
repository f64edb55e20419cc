use crate::{
    backend::LedgerBackend, error::Result, hints::parse_optional_timestamp, SearchCriteria,
    SearchHit,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Largest result set a search will request
pub const MAX_SEARCH_RESULTS: usize = 200;

/// Guidance returned when a search matches nothing, in this order
pub const NO_MATCH_SUGGESTIONS: [&str; 4] = [
    "Try expanding the time range if searching by date",
    "Check if the database or table name is spelled correctly",
    "Use list_batches to see all available batches",
    "Try searching without specific criteria to see recent batches",
];

pub const SEARCH_ERROR_SUGGESTION: &str =
    "An error occurred during search. Check your search criteria and try again.";

fn default_max_results() -> usize {
    50
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteriaInput {
    /// Find the batch containing this transaction
    pub transaction_hash: Option<String>,
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub merkle_root: Option<String>,
    pub min_transaction_count: Option<u64>,
    /// Partial batch id
    pub batch_id_pattern: Option<String>,
}

impl SearchCriteriaInput {
    fn to_criteria(&self) -> Result<SearchCriteria> {
        Ok(SearchCriteria {
            transaction_hash: self.transaction_hash.clone(),
            database_name: self.database_name.clone(),
            table_name: self.table_name.clone(),
            time_start: parse_optional_timestamp("time_start", self.time_start.as_deref())?,
            time_end: parse_optional_timestamp("time_end", self.time_end.as_deref())?,
            merkle_root: self.merkle_root.clone(),
            min_transaction_count: self.min_transaction_count,
            batch_id_pattern: self.batch_id_pattern.clone(),
        })
    }
}

/// `search_batches` request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchBatchesRequest {
    #[serde(default)]
    pub criteria: SearchCriteriaInput,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchBatchesRequest {
    fn default() -> Self {
        Self {
            criteria: SearchCriteriaInput::default(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub database_name: String,
    pub table_names: Vec<String>,
    pub transaction_count: u64,
    pub merkle_root: String,
    /// Why this batch matched
    pub match_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

impl From<SearchHit> for SearchMatch {
    fn from(hit: SearchHit) -> Self {
        Self {
            batch_id: hit.batch.batch_id,
            timestamp: hit.batch.timestamp,
            database_name: hit.batch.database_name,
            table_names: hit.batch.table_names,
            transaction_count: hit.batch.transaction_count,
            merkle_root: hit.batch.merkle_root,
            match_reason: hit.match_reason,
            relevance_score: hit.relevance_score,
        }
    }
}

/// Echo of the caller's criteria, or the reason the search failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaEcho {
    Error { error: String },
    Criteria(SearchCriteriaInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    pub total_matches: usize,
    pub search_time_ms: u64,
    pub search_criteria: CriteriaEcho,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Multi-criteria batch search
pub struct BatchSearcher {
    backend: Arc<dyn LedgerBackend>,
}

impl BatchSearcher {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    /// Search batches.
    ///
    /// `max_results` above [`MAX_SEARCH_RESULTS`] is clamped silently.
    pub async fn search(&self, request: SearchBatchesRequest) -> SearchResponse {
        let max_results = request.max_results.min(MAX_SEARCH_RESULTS);

        match self.try_search(&request.criteria, max_results).await {
            Ok((hits, search_time_ms)) => {
                let matches: Vec<SearchMatch> = hits.into_iter().map(SearchMatch::from).collect();
                info!("Batch search found {} matches in {}ms", matches.len(), search_time_ms);

                let suggestions = matches.is_empty().then(|| {
                    NO_MATCH_SUGGESTIONS
                        .iter()
                        .map(|s| s.to_string())
                        .collect()
                });

                SearchResponse {
                    total_matches: matches.len(),
                    matches,
                    search_time_ms,
                    search_criteria: CriteriaEcho::Criteria(request.criteria),
                    suggestions,
                }
            }
            Err(e) => {
                warn!("Batch search failed: {}", e);
                SearchResponse {
                    matches: Vec::new(),
                    total_matches: 0,
                    search_time_ms: 0,
                    search_criteria: CriteriaEcho::Error {
                        error: e.to_string(),
                    },
                    suggestions: Some(vec![SEARCH_ERROR_SUGGESTION.to_string()]),
                }
            }
        }
    }

    async fn try_search(
        &self,
        input: &SearchCriteriaInput,
        max_results: usize,
    ) -> Result<(Vec<SearchHit>, u64)> {
        let criteria = input.to_criteria()?;

        let started = Instant::now();
        let hits = self.backend.search_batches(&criteria, max_results).await?;
        let search_time_ms = started.elapsed().as_millis() as u64;

        Ok((hits, search_time_ms))
    }
}
