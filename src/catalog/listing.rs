use crate::{
    backend::LedgerBackend, error::Result, hints::parse_optional_timestamp, BatchFilter,
    BatchRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest page the listing will request
pub const MAX_LIST_LIMIT: usize = 1000;

fn default_limit() -> usize {
    100
}

fn default_order_by() -> String {
    "timestamp_desc".to_string()
}

/// Caller-facing listing filter; time bounds are ISO-8601 strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFilterInput {
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub min_transaction_count: Option<u64>,
    pub max_transaction_count: Option<u64>,
}

impl BatchFilterInput {
    /// Each time bound is parsed on its own; a lone bound is a valid
    /// open-ended range here.
    fn to_filter(&self) -> Result<BatchFilter> {
        Ok(BatchFilter {
            database_name: self.database_name.clone(),
            table_name: self.table_name.clone(),
            time_start: parse_optional_timestamp("time_start", self.time_start.as_deref())?,
            time_end: parse_optional_timestamp("time_end", self.time_end.as_deref())?,
            min_transaction_count: self.min_transaction_count,
            max_transaction_count: self.max_transaction_count,
        })
    }
}

/// `list_batches` request
#[derive(Debug, Clone, Deserialize)]
pub struct ListBatchesRequest {
    #[serde(default)]
    pub filter: Option<BatchFilterInput>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    /// One of timestamp_desc, timestamp_asc, count_desc, count_asc;
    /// validated by the backend
    #[serde(default = "default_order_by")]
    pub order_by: String,
}

impl Default for ListBatchesRequest {
    fn default() -> Self {
        Self {
            filter: None,
            limit: default_limit(),
            offset: 0,
            order_by: default_order_by(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub database_name: String,
    pub table_names: Vec<String>,
    pub transaction_count: u64,
    pub merkle_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl From<BatchRecord> for BatchSummary {
    fn from(record: BatchRecord) -> Self {
        Self {
            batch_id: record.batch_id,
            timestamp: record.timestamp,
            database_name: record.database_name,
            table_names: record.table_names,
            transaction_count: record.transaction_count,
            merkle_root: record.merkle_root,
            size_bytes: record.size_bytes,
        }
    }
}

/// Echo of the caller's filter, or the reason the listing failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterApplied {
    Error { error: String },
    Filter(BatchFilterInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchListResponse {
    pub batches: Vec<BatchSummary>,
    pub total_count: usize,
    pub offset: usize,
    /// Effective limit after clamping
    pub limit: usize,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_applied: Option<FilterApplied>,
}

/// Paginated batch listing
pub struct BatchLister {
    backend: Arc<dyn LedgerBackend>,
}

impl BatchLister {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    /// List batches.
    ///
    /// `limit` above [`MAX_LIST_LIMIT`] is clamped silently. Failures yield
    /// an empty page with the message in `filter_applied.error`.
    pub async fn list(&self, request: ListBatchesRequest) -> BatchListResponse {
        let limit = request.limit.min(MAX_LIST_LIMIT);
        if limit != request.limit {
            debug!("Clamping list limit {} to {}", request.limit, limit);
        }

        match self.try_list(&request, limit).await {
            Ok(mut response) => {
                response.filter_applied = request.filter.map(FilterApplied::Filter);
                response
            }
            Err(e) => {
                warn!("Batch listing failed: {}", e);
                BatchListResponse {
                    batches: Vec::new(),
                    total_count: 0,
                    offset: request.offset,
                    limit,
                    has_more: false,
                    filter_applied: Some(FilterApplied::Error {
                        error: e.to_string(),
                    }),
                }
            }
        }
    }

    async fn try_list(&self, request: &ListBatchesRequest, limit: usize) -> Result<BatchListResponse> {
        let filter = request
            .filter
            .as_ref()
            .map(BatchFilterInput::to_filter)
            .transpose()?;

        let page = self
            .backend
            .list_batches(filter.as_ref(), limit, request.offset, &request.order_by)
            .await?;

        Ok(BatchListResponse {
            batches: page.batches.into_iter().map(BatchSummary::from).collect(),
            total_count: page.total_count,
            offset: request.offset,
            limit,
            has_more: page.has_more,
            filter_applied: None,
        })
    }
}
