//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the submission client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Ledger (JSON-RPC + contract) settings.
    pub ledger: LedgerConfig,

    /// Novelty evaluation backend.
    pub evaluator: EvaluatorConfig,

    /// Content-addressed storage uploader.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (31337 for a local Hardhat/Anvil node).
    pub chain_id: u64,

    /// Address of the deployed result-recording contract.
    pub contract_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a submission is final.
    pub confirmation_blocks: u32,

    /// Upper bound on the confirmation wait, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 1000,
        }
    }
}

/// Evaluation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Base URL of the evaluation service (e.g., "http://localhost:8000").
    pub base_url: String,

    /// Request timeout in seconds. Evaluation runs a language model, so this is generous.
    pub timeout_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Which uploader pins evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    /// Forward to the evaluation backend's `/upload_ipfs/` route.
    #[default]
    Backend,
    /// Talk to Pinata directly.
    Pinata,
}

/// Storage uploader configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub provider: StorageProvider,

    /// Pinata JSON pinning endpoint.
    pub pinata_url: String,

    /// CID version requested from Pinata.
    pub cid_version: u8,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Backend,
            pinata_url: "https://api.pinata.cloud/pinning/pinJSONToIPFS".to_string(),
            cid_version: 1,
            timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_devnet() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.chain_id, 31337);
        assert_eq!(config.ledger.rpc_url, "http://localhost:8545");
        assert_eq!(config.evaluator.base_url, "http://localhost:8000");
        assert_eq!(config.storage.provider, StorageProvider::Backend);
        assert_eq!(config.storage.cid_version, 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [ledger]
            chain_id = 11155111

            [storage]
            provider = "pinata"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.chain_id, 11155111);
        assert_eq!(config.ledger.confirmation_blocks, 1);
        assert_eq!(config.storage.provider, StorageProvider::Pinata);
        assert_eq!(config.observability.log_level, "info");
    }
}
