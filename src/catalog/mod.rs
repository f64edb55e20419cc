//! Batch Catalog Module
//!
//! Read-only browsing of the audit trail:
//! - BatchLister: filtered, paginated batch listing
//! - BatchSearcher: multi-criteria search with suggestions on empty results
//! - LedgerInspector: single batch, NFT, contract and configuration lookups
//!
//! Like verification, every operation here returns a value, never an error.

mod inspector;
mod listing;
mod search;

#[cfg(test)]
mod tests;

pub use inspector::{ConfigReport, ContractSummary, LedgerInspector};
pub use listing::{
    BatchFilterInput, BatchListResponse, BatchLister, BatchSummary, FilterApplied,
    ListBatchesRequest, MAX_LIST_LIMIT,
};
pub use search::{
    BatchSearcher, CriteriaEcho, SearchBatchesRequest, SearchCriteriaInput, SearchMatch,
    SearchResponse, MAX_SEARCH_RESULTS, NO_MATCH_SUGGESTIONS, SEARCH_ERROR_SUGGESTION,
};
