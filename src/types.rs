use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arbitrary database row submitted for verification.
///
/// Field order is preserved exactly as received because the backend hashes
/// the payload in order.
pub type TransactionPayload = serde_json::Map<String, serde_json::Value>;

/// Database operation that produced a recorded transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Insert => write!(f, "INSERT"),
            OperationType::Update => write!(f, "UPDATE"),
            OperationType::Delete => write!(f, "DELETE"),
        }
    }
}

/// Closed time window used to scope a verification search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Canonical hint set handed to the backend.
///
/// Only ever built when at least one field is set; "no hints" is `None`
/// at the call site, which the backend treats as an unconstrained scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationHints {
    pub batch_id: Option<String>,
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    pub time_range: Option<TimeRange>,
    pub expected_operation: Option<OperationType>,
}

/// Inclusion proof returned by the backend for a verified transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_hash: String,
    pub proof_path: Vec<String>,
    pub sibling_positions: Vec<String>,
    pub merkle_root: String,
    pub is_valid: bool,
}

/// Per-call knobs for single-transaction verification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Verify against the contract only, skipping object storage
    pub use_contract_verification: bool,
    /// Timeout override in seconds, passed through untouched
    pub timeout: Option<u64>,
}

/// Per-call knobs for batch verification, forwarded to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchVerifyOptions {
    pub parallel: bool,
    pub fail_fast: bool,
}

/// Backend answer for one transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendVerification {
    pub verified: bool,
    pub transaction_hash: String,
    pub batch_id: Option<String>,
    pub blockchain_timestamp: Option<DateTime<Utc>>,
    pub operation_type: Option<OperationType>,
    pub merkle_proof: Option<MerkleProof>,
    pub error: Option<String>,
}

/// Aggregate statistics the backend reports for a batch verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendBatchSummary {
    pub success_rate: f64,
    pub average_verification_time_ms: f64,
    pub blockchain_confirmations: u64,
}

/// Backend answer for a batch verification.
///
/// `results` is positionally correlated with the submitted transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendBatchOutcome {
    pub total: usize,
    pub verified: usize,
    pub failed: usize,
    pub results: Vec<BackendVerification>,
    pub summary: BackendBatchSummary,
}

/// Object storage location of a batch's raw payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    pub key: String,
    pub region: String,
}

/// Batch metadata as recorded on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub database_name: String,
    pub table_names: Vec<String>,
    pub transaction_count: u64,
    pub merkle_root: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub s3_location: Option<StorageLocation>,
    #[serde(default)]
    pub operation_counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub nft_token_id: Option<String>,
}

/// One page of batch records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPage {
    pub batches: Vec<BatchRecord>,
    pub total_count: usize,
    pub has_more: bool,
}

/// Exact-match/range predicates for batch listing, ANDed by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFilter {
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    pub time_start: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub min_transaction_count: Option<u64>,
    pub max_transaction_count: Option<u64>,
}

/// Multi-criteria batch search query, ANDed by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub transaction_hash: Option<String>,
    pub database_name: Option<String>,
    pub table_name: Option<String>,
    pub time_start: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub merkle_root: Option<String>,
    pub min_transaction_count: Option<u64>,
    pub batch_id_pattern: Option<String>,
}

/// Search result as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub batch: BatchRecord,
    pub match_reason: String,
    pub relevance_score: Option<f64>,
}

/// A transaction as recorded inside a batch payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedTransaction {
    /// Identifier of the form `<batch>-<...>-<index>`
    pub transaction_id: String,
    pub hash: String,
    pub operation_type: OperationType,
    #[serde(default)]
    pub payload: TransactionPayload,
    #[serde(default)]
    pub merkle_proof: Option<MerkleProof>,
}

/// Raw transaction payload of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchData {
    pub batch_id: String,
    pub transactions: Vec<RecordedTransaction>,
}

/// Where a transaction sits inside its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLocation {
    pub operation_type: OperationType,
    pub position: Option<u64>,
}

/// On-chain NFT minted for a batch commitment (token id == batch id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftInfo {
    pub token_id: String,
    pub owner_id: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub minted_timestamp: DateTime<Utc>,
    pub batch_id: String,
    pub organization_id: String,
    pub merkle_root: String,
    pub blockchain_details: serde_json::Map<String, serde_json::Value>,
}

/// Contract-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub contract_id: String,
    pub total_batches: u64,
    pub total_transactions: u64,
    pub earliest_batch: Option<DateTime<Utc>>,
    pub latest_batch: Option<DateTime<Utc>>,
    pub supported_databases: Vec<String>,
}

/// Contract-level counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStats {
    pub total_batches: u64,
    pub total_transactions: u64,
    pub operation_counts: BTreeMap<String, u64>,
}
