//! Batch Verification
//!
//! Verifies an ordered list of transactions with one backend call. Results
//! are correlated with the input by position only, so order is preserved
//! exactly. A failure anywhere marks every transaction as failed; partial
//! results are never reported.

use crate::{
    backend::LedgerBackend,
    error::Result,
    hints::{HintNormalizer, HintsInput},
    BackendBatchOutcome, BackendVerification, BatchVerifyOptions, OperationType,
    TransactionPayload,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

fn default_parallel() -> bool {
    true
}

/// `verify_batch` request
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyBatchRequest {
    pub transactions: Vec<TransactionPayload>,
    #[serde(default)]
    pub hints: Option<HintsInput>,
    /// Let the backend fan out (forwarded as a preference)
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Let the backend stop at the first failure
    #[serde(default)]
    pub fail_fast: bool,
}

/// Per-transaction entry of a batch verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualResult {
    pub verified: bool,
    pub transaction_hash: String,
    pub batch_id: Option<String>,
    pub blockchain_timestamp: Option<DateTime<Utc>>,
    pub operation_type: Option<OperationType>,
    pub error: Option<String>,
}

impl From<BackendVerification> for IndividualResult {
    fn from(result: BackendVerification) -> Self {
        Self {
            operation_type: if result.verified {
                result.operation_type
            } else {
                None
            },
            verified: result.verified,
            transaction_hash: result.transaction_hash,
            batch_id: result.batch_id,
            blockchain_timestamp: result.blockchain_timestamp,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchVerificationSummary {
    pub success_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_verification_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_confirmations: Option<u64>,
    pub parallel_processing: bool,
    pub fail_fast_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints_used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchVerificationResult {
    pub total_transactions: usize,
    pub verified_count: usize,
    pub failed_count: usize,
    pub processing_time_ms: u64,
    pub verification_timestamp: DateTime<Utc>,
    /// Same order as the submitted transactions
    pub individual_results: Vec<IndividualResult>,
    pub summary: BatchVerificationSummary,
}

/// Verifies transaction lists through the backend's batch primitive
pub struct BatchVerifier {
    backend: Arc<dyn LedgerBackend>,
    normalizer: HintNormalizer,
}

impl BatchVerifier {
    pub fn new(backend: Arc<dyn LedgerBackend>, normalizer: HintNormalizer) -> Self {
        Self {
            backend,
            normalizer,
        }
    }

    /// Verify every transaction in `request`.
    ///
    /// On any error the whole batch is reported as failed with the message
    /// in `summary.error`.
    pub async fn verify(&self, request: VerifyBatchRequest) -> BatchVerificationResult {
        let verification_timestamp = Utc::now();
        let started = Instant::now();

        match self.try_verify(&request).await {
            Ok((outcome, hints_used)) => {
                info!(
                    "Batch verification: {}/{} verified",
                    outcome.verified, outcome.total
                );
                if outcome.results.len() != request.transactions.len() {
                    warn!(
                        "Backend returned {} results for {} transactions",
                        outcome.results.len(),
                        request.transactions.len()
                    );
                }

                BatchVerificationResult {
                    total_transactions: outcome.total,
                    verified_count: outcome.verified,
                    failed_count: outcome.failed,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    verification_timestamp,
                    individual_results: outcome
                        .results
                        .into_iter()
                        .map(IndividualResult::from)
                        .collect(),
                    summary: BatchVerificationSummary {
                        success_rate: outcome.summary.success_rate,
                        average_verification_time_ms: Some(
                            outcome.summary.average_verification_time_ms,
                        ),
                        blockchain_confirmations: Some(outcome.summary.blockchain_confirmations),
                        parallel_processing: request.parallel,
                        fail_fast_mode: request.fail_fast,
                        hints_used: Some(hints_used),
                        error: None,
                    },
                }
            }
            Err(e) => {
                warn!(
                    "Batch verification of {} transactions failed: {}",
                    request.transactions.len(),
                    e
                );
                BatchVerificationResult {
                    total_transactions: request.transactions.len(),
                    verified_count: 0,
                    failed_count: request.transactions.len(),
                    processing_time_ms: 0,
                    verification_timestamp,
                    individual_results: Vec::new(),
                    summary: BatchVerificationSummary {
                        success_rate: 0.0,
                        average_verification_time_ms: None,
                        blockchain_confirmations: None,
                        parallel_processing: request.parallel,
                        fail_fast_mode: request.fail_fast,
                        hints_used: None,
                        error: Some(e.to_string()),
                    },
                }
            }
        }
    }

    async fn try_verify(&self, request: &VerifyBatchRequest) -> Result<(BackendBatchOutcome, bool)> {
        let hints = self.normalizer.normalize(request.hints.as_ref())?;
        let options = BatchVerifyOptions {
            parallel: request.parallel,
            fail_fast: request.fail_fast,
        };

        let outcome = self
            .backend
            .verify_batch(&request.transactions, hints.as_ref(), options)
            .await?;

        Ok((outcome, hints.is_some()))
    }
}
