//! Single-Transaction Verification
//!
//! Flow of one `verify_transaction` call:
//! 1. Normalize hints (malformed timestamps fail the request)
//! 2. Gather search statistics: a direct lookup when a batch id hint is
//!    given, otherwise a sample of the most recent batches
//! 3. Ask the backend to verify the payload
//! 4. If verified: resolve the operation type (backend → batch scan → INSERT)
//!    and attach batch metadata
//!
//! Steps 2 and 4 are best-effort; only hint and backend verification
//! failures turn into an error result.

use crate::{
    backend::LedgerBackend,
    error::Result,
    hints::{HintNormalizer, HintsInput},
    BatchRecord, MerkleProof, OperationType, TransactionPayload, VerificationHints,
    VerifyOptions,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How many recent batches are sampled to rank a match
pub const DEFAULT_POSITION_SCAN_WINDOW: usize = 100;

/// `verify_transaction` request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyTransactionRequest {
    pub transaction_data: TransactionPayload,
    #[serde(default)]
    pub hints: Option<HintsInput>,
    /// Timeout override in seconds, handed to the backend
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Verify against the contract only (no object storage)
    #[serde(default)]
    pub use_contract_verification: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    #[default]
    Local,
    SmartContract,
}

/// How the matching batch was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub total_batches: usize,
    /// 1-based rank among the sampled batches, 0 if outside the sample
    pub batch_position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_lookup: Option<bool>,
}

/// Display metadata of the batch holding a verified transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub database: String,
    pub tables: Vec<String>,
    pub transaction_count: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<BatchRecord> for BatchInfo {
    fn from(record: BatchRecord) -> Self {
        Self {
            database: record.database_name,
            tables: record.table_names,
            transaction_count: record.transaction_count,
            timestamp: record.timestamp,
        }
    }
}

/// Outcome of verifying one transaction
///
/// When `verified` is false, `batch_info`, `merkle_proof`, `operation_type`
/// and `position` are always absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_info: Option<SearchInfo>,
    pub verification_method: VerificationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_proof: Option<MerkleProof>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_info: Option<BatchInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    pub processing_time_ms: u64,
}

impl VerificationResult {
    /// Result reported when the request could not be carried out
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            verified: false,
            transaction_hash: String::new(),
            error: Some(message.into()),
            processing_time_ms: 0,
            ..Default::default()
        }
    }
}

/// Batches considered when ranking a match
enum BatchSample {
    /// A batch id hint pins the search to one batch
    Direct,
    /// Ids of the most recent batches, newest first
    Recent(Vec<String>),
}

impl BatchSample {
    fn search_info(&self, matched: Option<&str>) -> SearchInfo {
        match self {
            BatchSample::Direct => SearchInfo {
                total_batches: 1,
                batch_position: 1,
                direct_lookup: Some(true),
            },
            BatchSample::Recent(ids) => SearchInfo {
                total_batches: ids.len(),
                batch_position: matched
                    .and_then(|batch_id| ids.iter().position(|id| id == batch_id))
                    .map(|index| index + 1)
                    .unwrap_or(0),
                direct_lookup: None,
            },
        }
    }
}

/// Verifies single transactions against the ledger
pub struct TransactionVerifier {
    backend: Arc<dyn LedgerBackend>,
    normalizer: HintNormalizer,
    /// Number of recent batches sampled for `batch_position`
    scan_window: usize,
}

impl TransactionVerifier {
    pub fn new(
        backend: Arc<dyn LedgerBackend>,
        normalizer: HintNormalizer,
        scan_window: usize,
    ) -> Self {
        Self {
            backend,
            normalizer,
            scan_window,
        }
    }

    /// Verify one transaction.
    ///
    /// Never fails: any error becomes a result with `verified: false` and
    /// the message in `error`.
    pub async fn verify(&self, request: VerifyTransactionRequest) -> VerificationResult {
        match self.try_verify(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Transaction verification failed: {}", e);
                VerificationResult::failure(e.to_string())
            }
        }
    }

    async fn try_verify(&self, request: &VerifyTransactionRequest) -> Result<VerificationResult> {
        let hints = self.normalizer.normalize(request.hints.as_ref())?;
        let started = Instant::now();

        let sample = self.sample_batches(hints.as_ref()).await;

        let options = VerifyOptions {
            use_contract_verification: request.use_contract_verification,
            timeout: request.timeout,
        };
        let outcome = self
            .backend
            .verify_transaction(&request.transaction_data, hints.as_ref(), options)
            .await?;

        let mut result = VerificationResult {
            verified: outcome.verified,
            transaction_hash: outcome.transaction_hash,
            batch_id: outcome.batch_id,
            blockchain_timestamp: outcome.blockchain_timestamp,
            error: outcome.error,
            verification_method: if request.use_contract_verification {
                VerificationMethod::SmartContract
            } else {
                VerificationMethod::Local
            },
            ..Default::default()
        };

        if result.verified {
            result.merkle_proof = outcome.merkle_proof;

            let (operation_type, position) = self
                .resolve_operation(
                    result.batch_id.as_deref(),
                    &result.transaction_hash,
                    outcome.operation_type,
                )
                .await;
            result.operation_type = Some(operation_type);
            result.position = position;

            if let Some(batch_id) = result.batch_id.as_deref() {
                result.batch_info = self.batch_info(batch_id).await;
            }

            info!(
                "Transaction {} verified in batch {:?} ({})",
                result.transaction_hash, result.batch_id, operation_type
            );
        } else {
            debug!("Transaction not verified: {:?}", result.error);
        }

        let matched = if result.verified {
            result.batch_id.as_deref()
        } else {
            None
        };
        result.search_info = Some(sample.search_info(matched));
        result.processing_time_ms = started.elapsed().as_millis() as u64;

        Ok(result)
    }

    /// Collect the batches used for search statistics.
    ///
    /// A failed listing only costs the statistics.
    async fn sample_batches(&self, hints: Option<&VerificationHints>) -> BatchSample {
        if hints.is_some_and(|h| h.batch_id.is_some()) {
            return BatchSample::Direct;
        }

        match self
            .backend
            .list_batches(None, self.scan_window, 0, "timestamp_desc")
            .await
        {
            Ok(page) => BatchSample::Recent(page.batches.into_iter().map(|b| b.batch_id).collect()),
            Err(e) => {
                warn!("Could not sample recent batches for search statistics: {}", e);
                BatchSample::Recent(Vec::new())
            }
        }
    }

    /// Resolve the operation type of a verified transaction
    ///
    /// # Tiers
    /// 1. The backend's own answer
    /// 2. A lookup of the transaction hash inside its batch, which also
    ///    yields the position within the batch
    /// 3. INSERT
    async fn resolve_operation(
        &self,
        batch_id: Option<&str>,
        transaction_hash: &str,
        reported: Option<OperationType>,
    ) -> (OperationType, Option<u64>) {
        if let Some(operation_type) = reported {
            return (operation_type, None);
        }

        if let Some(batch_id) = batch_id {
            match self.backend.locate_transaction(batch_id, transaction_hash).await {
                Ok(Some(location)) => return (location.operation_type, location.position),
                Ok(None) => {
                    debug!("Transaction {} not found in batch {} payload", transaction_hash, batch_id)
                }
                Err(e) => warn!("Operation type lookup in batch {} failed: {}", batch_id, e),
            }
        }

        (OperationType::Insert, None)
    }

    async fn batch_info(&self, batch_id: &str) -> Option<BatchInfo> {
        match self.backend.get_batch(batch_id).await {
            Ok(record) => record.map(BatchInfo::from),
            Err(e) => {
                warn!("Batch metadata for {} unavailable: {}", batch_id, e);
                None
            }
        }
    }
}
