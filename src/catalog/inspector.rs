//! Ledger Inspector
//!
//! Detail lookups around the batch catalog: a single batch, the NFT minted
//! for it, the organization's contract and the service configuration.
//! Lookups that find nothing, or fail, answer `None`.

use crate::{
    backend::{contract_address, LedgerBackend},
    config::LedgerConfig,
    error::BackendResult,
    BatchRecord, NftInfo,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Contract overview returned by `get_contract_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSummary {
    pub contract_address: String,
    pub organization_id: String,
    pub network: String,
    pub total_batches: u64,
    pub total_transactions: u64,
    pub oldest_batch_timestamp: Option<DateTime<Utc>>,
    pub newest_batch_timestamp: Option<DateTime<Utc>>,
    pub databases: Vec<String>,
    pub contract_version: Option<String>,
    pub treasury_address: Option<String>,
}

/// Service configuration returned by `get_config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReport {
    pub organization_id: String,
    pub network: String,
    pub contract_id: String,
    pub timeout: u64,
    pub cache_ttl: u64,
    pub max_retries: u32,
    pub aws_region: String,
    pub rpc_endpoint: Option<String>,
}

pub struct LedgerInspector {
    backend: Arc<dyn LedgerBackend>,
    config: LedgerConfig,
}

impl LedgerInspector {
    pub fn new(backend: Arc<dyn LedgerBackend>, config: LedgerConfig) -> Self {
        Self { backend, config }
    }

    /// Full metadata of one batch
    pub async fn get_batch(&self, batch_id: &str) -> Option<BatchRecord> {
        match self.backend.get_batch(batch_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Batch lookup for {} failed: {}", batch_id, e);
                None
            }
        }
    }

    /// NFT minted for a batch (token id == batch id)
    pub async fn get_nft(&self, token_id: &str) -> Option<NftInfo> {
        match self.backend.get_nft_info(token_id).await {
            Ok(nft) => nft,
            Err(e) => {
                warn!("NFT lookup for {} failed: {}", token_id, e);
                None
            }
        }
    }

    /// Contract overview.
    ///
    /// Falls back to the derived contract address when the backend has no
    /// contract record; on error the message is reported in
    /// `contract_version`.
    pub async fn get_contract_info(&self) -> ContractSummary {
        match self.try_contract_info().await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Contract info lookup failed: {}", e);
                ContractSummary {
                    contract_version: Some(format!("Error: {}", e)),
                    ..self.fallback_summary()
                }
            }
        }
    }

    async fn try_contract_info(&self) -> BackendResult<ContractSummary> {
        if let Some(info) = self.backend.get_contract_info().await? {
            return Ok(ContractSummary {
                contract_address: info.contract_id,
                organization_id: self.backend.organization_id().to_string(),
                network: self.backend.network().to_string(),
                total_batches: info.total_batches,
                total_transactions: info.total_transactions,
                oldest_batch_timestamp: info.earliest_batch,
                newest_batch_timestamp: info.latest_batch,
                databases: info.supported_databases,
                contract_version: None,
                treasury_address: None,
            });
        }

        debug!("No contract record, building summary from configuration");
        let mut summary = self.fallback_summary();
        if let Some(stats) = self.backend.get_contract_stats().await? {
            summary.total_batches = stats.total_batches;
            summary.total_transactions = stats.total_transactions;
        }
        Ok(summary)
    }

    fn fallback_summary(&self) -> ContractSummary {
        let organization_id = self.backend.organization_id().to_string();
        let network = self.backend.network().to_string();

        ContractSummary {
            contract_address: contract_address(&organization_id, &network),
            organization_id,
            network,
            total_batches: 0,
            total_transactions: 0,
            oldest_batch_timestamp: None,
            newest_batch_timestamp: None,
            databases: Vec::new(),
            contract_version: None,
            treasury_address: None,
        }
    }

    /// Organization, network and connection settings in effect
    pub fn get_config(&self) -> ConfigReport {
        ConfigReport {
            organization_id: self.config.organization_id.clone(),
            network: self.config.network.clone(),
            contract_id: contract_address(&self.config.organization_id, &self.config.network),
            timeout: self.config.timeout_secs,
            cache_ttl: self.config.cache_ttl_secs,
            max_retries: self.config.max_retries,
            aws_region: self.config.aws_region.clone(),
            rpc_endpoint: self.config.rpc_endpoint.clone(),
        }
    }
}
