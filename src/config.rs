//! Configuration Module
//!
//! This module defines all configuration structures for the verifier.
//! Configuration is loaded from TOML files and parsed using serde.

use crate::hints::TimeRangePolicy;
use crate::verification::DEFAULT_POSITION_SCAN_WINDOW;
use serde::Deserialize;
use std::fs;

/// Main configuration structure
///
/// Loaded from a TOML file (e.g., config/default.toml).
///
/// # Example TOML
/// ```toml
/// [api]
/// host = "127.0.0.1"
/// port = 8000
///
/// [ledger]
/// organization_id = "lunaris"
/// network = "testnet"
///
/// [verification]
/// strict_time_range = false
/// position_scan_window = 100
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// API server configuration
///
/// # Fields
/// - `host`: IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// - `port`: TCP port to listen on (e.g., 8000)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

/// Ledger connection configuration
///
/// Identifies whose audit trail is read and how the backend is reached.
///
/// # Fields
/// - `organization_id`: Organization owning the contract (required)
/// - `network`: "testnet" or "mainnet"; decides the contract suffix
/// - `rpc_endpoint`: Custom RPC endpoint, network default if unset
/// - `timeout_secs`, `cache_ttl_secs`, `max_retries`: Backend client tuning
/// - `aws_region`: Region of the object storage holding batch payloads
/// - `snapshot_path`: JSON snapshot served by the local ledger
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    pub organization_id: String,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_aws_region")]
    pub aws_region: String,
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// Verification behaviour
///
/// # Fields
/// - `strict_time_range`: Reject hints carrying only one time bound
///   instead of dropping the bound
/// - `position_scan_window`: Recent batches sampled to rank a match
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub strict_time_range: bool,
    #[serde(default = "default_position_scan_window")]
    pub position_scan_window: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            strict_time_range: false,
            position_scan_window: DEFAULT_POSITION_SCAN_WINDOW,
        }
    }
}

impl VerificationConfig {
    pub fn time_range_policy(&self) -> TimeRangePolicy {
        if self.strict_time_range {
            TimeRangePolicy::Strict
        } else {
            TimeRangePolicy::Lenient
        }
    }
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_aws_region() -> String {
    "us-west-2".to_string()
}

fn default_position_scan_window() -> usize {
    DEFAULT_POSITION_SCAN_WINDOW
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// `ETRAP_ORGANIZATION` and `ETRAP_NETWORK`, when set, override the
    /// ledger identity from the file.
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read, the TOML is invalid, or no
    ///   organization is configured
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(organization) = lookup("ETRAP_ORGANIZATION").filter(|v| !v.is_empty()) {
            self.ledger.organization_id = organization;
        }
        if let Some(network) = lookup("ETRAP_NETWORK").filter(|v| !v.is_empty()) {
            self.ledger.network = network;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ledger.organization_id.trim().is_empty() {
            anyhow::bail!("ledger.organization_id is required (or set ETRAP_ORGANIZATION)");
        }
        if self.verification.position_scan_window == 0 {
            anyhow::bail!("verification.position_scan_window must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [api]
        host = "127.0.0.1"
        port = 8000

        [ledger]
        organization_id = "lunaris"
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.ledger.network, "testnet");
        assert_eq!(config.ledger.timeout_secs, 30);
        assert_eq!(config.ledger.cache_ttl_secs, 300);
        assert_eq!(config.ledger.max_retries, 3);
        assert_eq!(config.ledger.aws_region, "us-west-2");
        assert!(config.ledger.snapshot_path.is_none());
        assert!(!config.verification.strict_time_range);
        assert_eq!(config.verification.position_scan_window, 100);
        assert_eq!(config.verification.time_range_policy(), TimeRangePolicy::Lenient);
    }

    #[test]
    fn test_strict_time_range_selects_strict_policy() {
        let text = format!("{}\n[verification]\nstrict_time_range = true\n", MINIMAL);
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.verification.time_range_policy(), TimeRangePolicy::Strict);
        assert_eq!(config.verification.position_scan_window, 100);
    }

    #[test]
    fn test_env_overrides_identity() {
        let mut config = Config::parse(MINIMAL).unwrap();
        config.apply_env_overrides(|key| match key {
            "ETRAP_ORGANIZATION" => Some("acme".to_string()),
            "ETRAP_NETWORK" => Some("mainnet".to_string()),
            _ => None,
        });
        assert_eq!(config.ledger.organization_id, "acme");
        assert_eq!(config.ledger.network, "mainnet");
    }

    #[test]
    fn test_validation_rejects_missing_organization() {
        let text = MINIMAL.replace("\"lunaris\"", "\"\"");
        let config = Config::parse(&text).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_ledger_section_is_an_error() {
        assert!(Config::parse("[api]\nhost = \"0.0.0.0\"\nport = 1\n").is_err());
    }
}
