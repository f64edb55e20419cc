//! Scripted ledger for unit tests.
//!
//! Every answer is fixed up front, every call is recorded, and any operation
//! can be made to fail with a transport error.

use super::client::LedgerBackend;
use crate::{
    error::{BackendError, BackendResult},
    BackendBatchOutcome, BackendVerification, BatchData, BatchFilter, BatchPage, BatchRecord,
    BatchVerifyOptions, ContractInfo, ContractStats, NftInfo, SearchCriteria, SearchHit,
    TransactionPayload, VerificationHints, VerifyOptions,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

pub(crate) struct ScriptedLedger {
    pub organization_id: String,
    pub network: String,
    pub verification: BackendVerification,
    pub batch_outcome: BackendBatchOutcome,
    pub batches: Vec<BatchRecord>,
    pub batch_data: Vec<BatchData>,
    pub search_hits: Vec<SearchHit>,
    pub nft: Option<NftInfo>,
    pub contract_info: Option<ContractInfo>,
    pub contract_stats: Option<ContractStats>,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
    hints_seen: Mutex<Vec<Option<VerificationHints>>>,
    filters_seen: Mutex<Vec<Option<BatchFilter>>>,
    criteria_seen: Mutex<Vec<SearchCriteria>>,
    options_seen: Mutex<Vec<VerifyOptions>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            organization_id: "lunaris".to_string(),
            network: "testnet".to_string(),
            verification: BackendVerification::default(),
            batch_outcome: BackendBatchOutcome::default(),
            batches: Vec::new(),
            batch_data: Vec::new(),
            search_hits: Vec::new(),
            nft: None,
            contract_info: None,
            contract_stats: None,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            hints_seen: Mutex::new(Vec::new()),
            filters_seen: Mutex::new(Vec::new()),
            criteria_seen: Mutex::new(Vec::new()),
            options_seen: Mutex::new(Vec::new()),
        }
    }

    /// Make `operation` return a transport error
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls().iter().any(|c| c.split(' ').next() == Some(operation))
    }

    pub fn hints_seen(&self) -> Vec<Option<VerificationHints>> {
        self.hints_seen.lock().unwrap().clone()
    }

    pub fn filters_seen(&self) -> Vec<Option<BatchFilter>> {
        self.filters_seen.lock().unwrap().clone()
    }

    pub fn criteria_seen(&self) -> Vec<SearchCriteria> {
        self.criteria_seen.lock().unwrap().clone()
    }

    pub fn options_seen(&self) -> Vec<VerifyOptions> {
        self.options_seen.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> BackendResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", operation, detail).trim_end().to_string());
        if self.failing.contains(operation) {
            return Err(BackendError::Transport(format!("{} unavailable", operation)));
        }
        Ok(())
    }
}

/// A batch record with sensible defaults
pub(crate) fn batch_record(batch_id: &str) -> BatchRecord {
    BatchRecord {
        batch_id: batch_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 7, 1, 9, 55, 0).unwrap(),
        database_name: "production".to_string(),
        table_names: vec!["financial_transactions".to_string()],
        transaction_count: 12,
        merkle_root: format!("root-{}", batch_id),
        size_bytes: Some(2048),
        s3_location: None,
        operation_counts: None,
        contract_address: "lunaris.testnet".to_string(),
        nft_token_id: Some(batch_id.to_string()),
    }
}

#[async_trait]
impl LedgerBackend for ScriptedLedger {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }

    fn network(&self) -> &str {
        &self.network
    }

    async fn verify_transaction(
        &self,
        _payload: &TransactionPayload,
        hints: Option<&VerificationHints>,
        options: VerifyOptions,
    ) -> BackendResult<BackendVerification> {
        self.hints_seen.lock().unwrap().push(hints.cloned());
        self.options_seen.lock().unwrap().push(options);
        self.record("verify_transaction", String::new())?;
        Ok(self.verification.clone())
    }

    async fn verify_batch(
        &self,
        transactions: &[TransactionPayload],
        hints: Option<&VerificationHints>,
        options: BatchVerifyOptions,
    ) -> BackendResult<BackendBatchOutcome> {
        self.hints_seen.lock().unwrap().push(hints.cloned());
        self.record(
            "verify_batch",
            format!(
                "count={} parallel={} fail_fast={}",
                transactions.len(),
                options.parallel,
                options.fail_fast
            ),
        )?;
        Ok(self.batch_outcome.clone())
    }

    async fn get_batch(&self, batch_id: &str) -> BackendResult<Option<BatchRecord>> {
        self.record("get_batch", batch_id.to_string())?;
        Ok(self.batches.iter().find(|b| b.batch_id == batch_id).cloned())
    }

    async fn get_batch_data(&self, batch_id: &str) -> BackendResult<Option<BatchData>> {
        self.record("get_batch_data", batch_id.to_string())?;
        Ok(self.batch_data.iter().find(|d| d.batch_id == batch_id).cloned())
    }

    async fn list_batches(
        &self,
        filter: Option<&BatchFilter>,
        limit: usize,
        offset: usize,
        order_by: &str,
    ) -> BackendResult<BatchPage> {
        self.filters_seen.lock().unwrap().push(filter.cloned());
        self.record(
            "list_batches",
            format!("limit={} offset={} order_by={}", limit, offset, order_by),
        )?;
        let page: Vec<BatchRecord> = self.batches.iter().skip(offset).take(limit).cloned().collect();
        Ok(BatchPage {
            has_more: offset + page.len() < self.batches.len(),
            total_count: self.batches.len(),
            batches: page,
        })
    }

    async fn search_batches(
        &self,
        criteria: &SearchCriteria,
        max_results: usize,
    ) -> BackendResult<Vec<SearchHit>> {
        self.criteria_seen.lock().unwrap().push(criteria.clone());
        self.record("search_batches", format!("max_results={}", max_results))?;
        Ok(self.search_hits.iter().take(max_results).cloned().collect())
    }

    async fn get_nft_info(&self, token_id: &str) -> BackendResult<Option<NftInfo>> {
        self.record("get_nft_info", token_id.to_string())?;
        Ok(self.nft.clone())
    }

    async fn get_contract_info(&self) -> BackendResult<Option<ContractInfo>> {
        self.record("get_contract_info", String::new())?;
        Ok(self.contract_info.clone())
    }

    async fn get_contract_stats(&self) -> BackendResult<Option<ContractStats>> {
        self.record("get_contract_stats", String::new())?;
        Ok(self.contract_stats.clone())
    }
}
