//! Ledger backend contract.

use crate::{
    error::BackendResult, BackendBatchOutcome, BackendVerification, BatchData, BatchFilter,
    BatchPage, BatchRecord, BatchVerifyOptions, ContractInfo, ContractStats, NftInfo,
    SearchCriteria, SearchHit, TransactionLocation, TransactionPayload, VerificationHints,
    VerifyOptions,
};
use async_trait::async_trait;

/// Derive the contract account for an organization on a network.
///
/// Mainnet contracts live under `.near`; every other network uses the
/// network name as the suffix.
pub fn contract_address(organization_id: &str, network: &str) -> String {
    if network == "mainnet" {
        format!("{}.near", organization_id)
    } else {
        format!("{}.{}", organization_id, network)
    }
}

/// Extract the position encoded in a transaction identifier.
///
/// Identifiers end with a numeric index after the last `-`
/// (e.g. `BATCH-2025-06-14-abc123-7` is position 7).
pub fn position_from_transaction_id(transaction_id: &str) -> Option<u64> {
    transaction_id
        .rsplit('-')
        .next()
        .and_then(|token| token.parse::<u64>().ok())
}

/// Read-only view of the blockchain-anchored audit trail.
///
/// Implementations must tolerate concurrent use: one handle is shared by
/// every in-flight request.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Organization whose contract is queried
    fn organization_id(&self) -> &str;

    /// Network the contract is deployed on (e.g. "testnet", "mainnet")
    fn network(&self) -> &str;

    /// Contract account derived from organization and network
    fn contract_id(&self) -> String {
        contract_address(self.organization_id(), self.network())
    }

    /// Verify one transaction payload.
    ///
    /// `hints == None` means an unconstrained scan.
    async fn verify_transaction(
        &self,
        payload: &TransactionPayload,
        hints: Option<&VerificationHints>,
        options: VerifyOptions,
    ) -> BackendResult<BackendVerification>;

    /// Verify many payloads, returning results in input order
    async fn verify_batch(
        &self,
        transactions: &[TransactionPayload],
        hints: Option<&VerificationHints>,
        options: BatchVerifyOptions,
    ) -> BackendResult<BackendBatchOutcome>;

    /// Batch metadata, or `None` if the batch does not exist
    async fn get_batch(&self, batch_id: &str) -> BackendResult<Option<BatchRecord>>;

    /// Recorded transactions of a batch, or `None` if unavailable
    async fn get_batch_data(&self, batch_id: &str) -> BackendResult<Option<BatchData>>;

    /// Find a transaction by hash inside a batch.
    ///
    /// The default scans the batch payload from [`LedgerBackend::get_batch_data`];
    /// backends with an index should override it.
    async fn locate_transaction(
        &self,
        batch_id: &str,
        transaction_hash: &str,
    ) -> BackendResult<Option<TransactionLocation>> {
        let Some(data) = self.get_batch_data(batch_id).await? else {
            return Ok(None);
        };

        Ok(data
            .transactions
            .iter()
            .find(|tx| tx.hash == transaction_hash)
            .map(|tx| TransactionLocation {
                operation_type: tx.operation_type,
                position: position_from_transaction_id(&tx.transaction_id),
            }))
    }

    /// One page of batches matching `filter`, ordered by `order_by`
    async fn list_batches(
        &self,
        filter: Option<&BatchFilter>,
        limit: usize,
        offset: usize,
        order_by: &str,
    ) -> BackendResult<BatchPage>;

    /// Batches matching `criteria`, most relevant first
    async fn search_batches(
        &self,
        criteria: &SearchCriteria,
        max_results: usize,
    ) -> BackendResult<Vec<SearchHit>>;

    async fn get_nft_info(&self, token_id: &str) -> BackendResult<Option<NftInfo>>;

    async fn get_contract_info(&self) -> BackendResult<Option<ContractInfo>>;

    async fn get_contract_stats(&self) -> BackendResult<Option<ContractStats>>;
}
