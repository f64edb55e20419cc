//! Snapshot Ledger Module
//!
//! An in-process `LedgerBackend` that serves a frozen copy of the audit trail
//! loaded from a JSON snapshot. Used for local runs and demos where no
//! blockchain RPC or object storage is reachable.
//!
//! Transactions are matched by payload equality: the snapshot already carries
//! each transaction's recorded hash and proof, so nothing is recomputed.

use super::client::{contract_address, LedgerBackend};
use crate::{
    error::{BackendError, BackendResult},
    BackendBatchOutcome, BackendBatchSummary, BackendVerification, BatchData, BatchFilter,
    BatchPage, BatchRecord, BatchVerifyOptions, ContractInfo, ContractStats, NftInfo,
    RecordedTransaction, SearchCriteria, SearchHit, TransactionPayload, VerificationHints,
    VerifyOptions,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

/// A batch together with its recorded transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBatch {
    #[serde(flatten)]
    pub record: BatchRecord,
    #[serde(default)]
    pub transactions: Vec<RecordedTransaction>,
}

/// On-disk snapshot format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub batches: Vec<LedgerBatch>,
}

/// Snapshot-backed ledger
///
/// Cheap to clone; clones share the same batch set.
#[derive(Clone)]
pub struct SnapshotLedger {
    organization_id: String,
    network: String,
    batches: Arc<RwLock<Vec<LedgerBatch>>>,
}

impl SnapshotLedger {
    /// Creates an empty ledger for the given organization and network
    pub fn new(organization_id: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            network: network.into(),
            batches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a ledger pre-populated from a snapshot
    pub fn from_snapshot(
        organization_id: impl Into<String>,
        network: impl Into<String>,
        snapshot: LedgerSnapshot,
    ) -> Self {
        let mut ledger = Self::new(organization_id, network);
        let contract = ledger.contract_id();
        let batches = snapshot
            .batches
            .into_iter()
            .map(|mut batch| {
                if batch.record.contract_address.is_empty() {
                    batch.record.contract_address = contract.clone();
                }
                batch
            })
            .collect();
        ledger.batches = Arc::new(RwLock::new(batches));
        ledger
    }

    /// Load a snapshot file
    ///
    /// # Returns
    /// * `Ok(SnapshotLedger)` if the file was read and parsed
    /// * `Err` if the file couldn't be read or the JSON is invalid
    pub fn load(
        organization_id: impl Into<String>,
        network: impl Into<String>,
        path: &str,
    ) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&content)?;
        info!("Loaded ledger snapshot {} with {} batches", path, snapshot.batches.len());
        Ok(Self::from_snapshot(organization_id, network, snapshot))
    }

    async fn newest_first(&self) -> Vec<LedgerBatch> {
        let batches = self.batches.read().await;
        let mut sorted = batches.clone();
        sorted.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
        sorted
    }

    fn lookup(
        batches: &[LedgerBatch],
        payload: &TransactionPayload,
        hints: Option<&VerificationHints>,
    ) -> BackendVerification {
        for batch in batches.iter().filter(|b| matches_hints(&b.record, hints)) {
            let expected = hints.and_then(|h| h.expected_operation);
            let found = batch.transactions.iter().find(|tx| {
                &tx.payload == payload && expected.is_none_or(|op| op == tx.operation_type)
            });

            if let Some(tx) = found {
                return BackendVerification {
                    verified: true,
                    transaction_hash: tx.hash.clone(),
                    batch_id: Some(batch.record.batch_id.clone()),
                    blockchain_timestamp: Some(batch.record.timestamp),
                    operation_type: Some(tx.operation_type),
                    merkle_proof: tx.merkle_proof.clone(),
                    error: None,
                };
            }
        }

        BackendVerification {
            verified: false,
            error: Some("Transaction not found in any matching batch".to_string()),
            ..Default::default()
        }
    }
}

fn matches_hints(record: &BatchRecord, hints: Option<&VerificationHints>) -> bool {
    let Some(hints) = hints else {
        return true;
    };

    hints.batch_id.as_ref().is_none_or(|id| &record.batch_id == id)
        && hints
            .database_name
            .as_ref()
            .is_none_or(|db| &record.database_name == db)
        && hints
            .table_name
            .as_ref()
            .is_none_or(|table| record.table_names.contains(table))
        && hints
            .time_range
            .is_none_or(|range| range.contains(record.timestamp))
}

fn matches_filter(record: &BatchRecord, filter: &BatchFilter) -> bool {
    filter
        .database_name
        .as_ref()
        .is_none_or(|db| &record.database_name == db)
        && filter
            .table_name
            .as_ref()
            .is_none_or(|table| record.table_names.contains(table))
        && filter.time_start.is_none_or(|start| record.timestamp >= start)
        && filter.time_end.is_none_or(|end| record.timestamp <= end)
        && filter
            .min_transaction_count
            .is_none_or(|min| record.transaction_count >= min)
        && filter
            .max_transaction_count
            .is_none_or(|max| record.transaction_count <= max)
}

/// Evaluate every criterion against a batch.
///
/// Returns `None` when any supplied criterion fails, otherwise the reasons
/// that matched.
fn match_criteria(batch: &LedgerBatch, criteria: &SearchCriteria) -> Option<Vec<String>> {
    let record = &batch.record;
    let mut reasons = Vec::new();

    if let Some(hash) = &criteria.transaction_hash {
        if !batch.transactions.iter().any(|tx| &tx.hash == hash) {
            return None;
        }
        reasons.push(format!("contains transaction {}", hash));
    }
    if let Some(db) = &criteria.database_name {
        if &record.database_name != db {
            return None;
        }
        reasons.push(format!("database {}", db));
    }
    if let Some(table) = &criteria.table_name {
        if !record.table_names.contains(table) {
            return None;
        }
        reasons.push(format!("table {}", table));
    }
    if criteria.time_start.is_some() || criteria.time_end.is_some() {
        let after_start = criteria.time_start.is_none_or(|s| record.timestamp >= s);
        let before_end = criteria.time_end.is_none_or(|e| record.timestamp <= e);
        if !(after_start && before_end) {
            return None;
        }
        reasons.push("within time range".to_string());
    }
    if let Some(root) = &criteria.merkle_root {
        if &record.merkle_root != root {
            return None;
        }
        reasons.push("merkle root match".to_string());
    }
    if let Some(min) = criteria.min_transaction_count {
        if record.transaction_count < min {
            return None;
        }
        reasons.push(format!("at least {} transactions", min));
    }
    if let Some(pattern) = &criteria.batch_id_pattern {
        if !record
            .batch_id
            .to_lowercase()
            .contains(&pattern.to_lowercase())
        {
            return None;
        }
        reasons.push(format!("batch id matches '{}'", pattern));
    }

    Some(reasons)
}

fn criteria_count(criteria: &SearchCriteria) -> usize {
    [
        criteria.transaction_hash.is_some(),
        criteria.database_name.is_some(),
        criteria.table_name.is_some(),
        criteria.time_start.is_some() || criteria.time_end.is_some(),
        criteria.merkle_root.is_some(),
        criteria.min_transaction_count.is_some(),
        criteria.batch_id_pattern.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count()
}

#[async_trait]
impl LedgerBackend for SnapshotLedger {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }

    fn network(&self) -> &str {
        &self.network
    }

    async fn verify_transaction(
        &self,
        payload: &TransactionPayload,
        hints: Option<&VerificationHints>,
        options: VerifyOptions,
    ) -> BackendResult<BackendVerification> {
        debug!(
            "Snapshot verification (contract_only={}, timeout={:?})",
            options.use_contract_verification, options.timeout
        );
        let batches = self.newest_first().await;
        Ok(Self::lookup(&batches, payload, hints))
    }

    async fn verify_batch(
        &self,
        transactions: &[TransactionPayload],
        hints: Option<&VerificationHints>,
        options: BatchVerifyOptions,
    ) -> BackendResult<BackendBatchOutcome> {
        // Lookups are in-memory, so `parallel` has nothing to fan out.
        let batches = self.newest_first().await;
        let started = Instant::now();
        let mut results = Vec::with_capacity(transactions.len());
        let mut stopped = false;

        for payload in transactions {
            if stopped {
                results.push(BackendVerification {
                    verified: false,
                    error: Some("Skipped after an earlier failure (fail_fast)".to_string()),
                    ..Default::default()
                });
                continue;
            }

            let result = Self::lookup(&batches, payload, hints);
            if !result.verified && options.fail_fast {
                stopped = true;
            }
            results.push(result);
        }

        let total = results.len();
        let verified = results.iter().filter(|r| r.verified).count();
        let confirmed_batches: BTreeSet<&str> = results
            .iter()
            .filter_map(|r| r.batch_id.as_deref())
            .collect();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let summary = BackendBatchSummary {
            success_rate: if total == 0 {
                0.0
            } else {
                verified as f64 / total as f64
            },
            average_verification_time_ms: if total == 0 {
                0.0
            } else {
                elapsed_ms / total as f64
            },
            blockchain_confirmations: confirmed_batches.len() as u64,
        };

        Ok(BackendBatchOutcome {
            total,
            verified,
            failed: total - verified,
            results,
            summary,
        })
    }

    async fn get_batch(&self, batch_id: &str) -> BackendResult<Option<BatchRecord>> {
        let batches = self.batches.read().await;
        Ok(batches
            .iter()
            .find(|b| b.record.batch_id == batch_id)
            .map(|b| b.record.clone()))
    }

    async fn get_batch_data(&self, batch_id: &str) -> BackendResult<Option<BatchData>> {
        let batches = self.batches.read().await;
        Ok(batches
            .iter()
            .find(|b| b.record.batch_id == batch_id)
            .map(|b| BatchData {
                batch_id: b.record.batch_id.clone(),
                transactions: b.transactions.clone(),
            }))
    }

    async fn list_batches(
        &self,
        filter: Option<&BatchFilter>,
        limit: usize,
        offset: usize,
        order_by: &str,
    ) -> BackendResult<BatchPage> {
        let batches = self.batches.read().await;
        let mut records: Vec<BatchRecord> = batches
            .iter()
            .map(|b| &b.record)
            .filter(|record| filter.is_none_or(|f| matches_filter(record, f)))
            .cloned()
            .collect();

        match order_by {
            "timestamp_desc" => records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            "timestamp_asc" => records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            "count_desc" => {
                records.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count))
            }
            "count_asc" => records.sort_by(|a, b| a.transaction_count.cmp(&b.transaction_count)),
            other => {
                return Err(BackendError::InvalidArgument(format!(
                    "unsupported order_by '{}'",
                    other
                )));
            }
        }

        let total_count = records.len();
        let page: Vec<BatchRecord> = records.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(page.len()) < total_count;

        Ok(BatchPage {
            batches: page,
            total_count,
            has_more,
        })
    }

    async fn search_batches(
        &self,
        criteria: &SearchCriteria,
        max_results: usize,
    ) -> BackendResult<Vec<SearchHit>> {
        let specified = criteria_count(criteria);
        let mut hits: Vec<SearchHit> = self
            .newest_first()
            .await
            .into_iter()
            .filter_map(|batch| {
                let reasons = match_criteria(&batch, criteria)?;
                let (match_reason, relevance_score) = if specified == 0 {
                    ("recent batch".to_string(), None)
                } else {
                    (
                        reasons.join(", "),
                        Some(reasons.len() as f64 / specified as f64),
                    )
                };
                Some(SearchHit {
                    batch: batch.record,
                    match_reason,
                    relevance_score,
                })
            })
            .collect();

        // Stable sort keeps newest-first order among equal scores.
        hits.sort_by(|a, b| {
            let a = a.relevance_score.unwrap_or(0.0);
            let b = b.relevance_score.unwrap_or(0.0);
            b.total_cmp(&a)
        });
        hits.truncate(max_results);
        Ok(hits)
    }

    async fn get_nft_info(&self, token_id: &str) -> BackendResult<Option<NftInfo>> {
        let batches = self.batches.read().await;
        let Some(batch) = batches
            .iter()
            .find(|b| b.record.nft_token_id.as_deref() == Some(token_id))
        else {
            return Ok(None);
        };
        let record = &batch.record;
        let contract = contract_address(&self.organization_id, &self.network);

        let mut metadata = serde_json::Map::new();
        metadata.insert("title".into(), format!("Audit batch {}", record.batch_id).into());
        metadata.insert("database".into(), record.database_name.clone().into());
        metadata.insert("tables".into(), record.table_names.clone().into());
        metadata.insert("transaction_count".into(), record.transaction_count.into());

        let mut blockchain_details = serde_json::Map::new();
        blockchain_details.insert("contract_id".into(), contract.clone().into());
        blockchain_details.insert("network".into(), self.network.clone().into());

        Ok(Some(NftInfo {
            token_id: token_id.to_string(),
            owner_id: contract,
            metadata,
            minted_timestamp: record.timestamp,
            batch_id: record.batch_id.clone(),
            organization_id: self.organization_id.clone(),
            merkle_root: record.merkle_root.clone(),
            blockchain_details,
        }))
    }

    async fn get_contract_info(&self) -> BackendResult<Option<ContractInfo>> {
        let batches = self.batches.read().await;
        if batches.is_empty() {
            return Ok(None);
        }

        let databases: BTreeSet<String> = batches
            .iter()
            .map(|b| b.record.database_name.clone())
            .collect();

        Ok(Some(ContractInfo {
            contract_id: contract_address(&self.organization_id, &self.network),
            total_batches: batches.len() as u64,
            total_transactions: batches.iter().map(|b| b.record.transaction_count).sum(),
            earliest_batch: batches.iter().map(|b| b.record.timestamp).min(),
            latest_batch: batches.iter().map(|b| b.record.timestamp).max(),
            supported_databases: databases.into_iter().collect(),
        }))
    }

    async fn get_contract_stats(&self) -> BackendResult<Option<ContractStats>> {
        let batches = self.batches.read().await;
        let mut operation_counts: BTreeMap<String, u64> = BTreeMap::new();
        for batch in batches.iter() {
            for tx in &batch.transactions {
                *operation_counts.entry(tx.operation_type.to_string()).or_default() += 1;
            }
        }

        Ok(Some(ContractStats {
            total_batches: batches.len() as u64,
            total_transactions: batches.iter().map(|b| b.record.transaction_count).sum(),
            operation_counts,
        }))
    }
}
