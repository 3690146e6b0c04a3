//! Read-side JSON-RPC access for confirmation polling and health checks.
//!
//! Every query runs against the primary endpoint first, then each failover in
//! order, with the configured per-call timeout.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use tokio::time::timeout;

use crate::config::LedgerConfig;
use crate::ledger::types::{ChainId, LedgerFault};
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

#[derive(Clone)]
pub struct RpcClient {
    /// Primary first, then failovers.
    providers: Vec<DynProvider>,
    /// Primary endpoint, reused for signing providers.
    primary_url: url::Url,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl RpcClient {
    /// Unreachable endpoints do not fail construction; the first query
    /// reports them. Only a malformed primary URL is an error.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerFault> {
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerFault::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let failovers = config.failover_urls.iter().filter_map(|raw| match raw.parse() {
            Ok(url) => Some(url),
            Err(_) => {
                tracing::warn!(url = %raw, "Ignoring invalid failover RPC URL");
                None
            }
        });
        let providers = std::iter::once(primary_url.clone())
            .chain(failovers)
            .map(|url| Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider)
            .collect();

        Ok(Self {
            providers,
            primary_url,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    /// Run `query` against each endpoint until one answers in time.
    async fn with_failover<T, E, Fut>(
        &self,
        what: &'static str,
        query: impl Fn(DynProvider) -> Fut,
    ) -> Result<T, LedgerFault>
    where
        E: Display,
        Fut: Future<Output = Result<T, E>>,
    {
        for (idx, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, query(Arc::clone(provider))).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => tracing::warn!(provider_idx = idx, query = what, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = idx, query = what, "RPC timeout"),
            }
        }
        Err(LedgerFault::Rpc(format!("All RPC providers failed: {}", what)))
    }

    pub async fn get_chain_id(&self) -> Result<ChainId, LedgerFault> {
        self.with_failover("chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    pub async fn get_block_number(&self) -> Result<u64, LedgerFault> {
        self.with_failover("block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// `None` while the transaction is pending.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, LedgerFault> {
        self.with_failover("receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// The endpoint must be on the configured chain.
    pub async fn verify_chain_id(&self) -> Result<(), LedgerFault> {
        let ChainId(actual) = self.get_chain_id().await?;
        if actual != self.config.chain_id {
            return Err(LedgerFault::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Reachable and on the expected chain.
    pub async fn is_healthy(&self) -> bool {
        let healthy = match self.verify_chain_id().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Ledger health check failed");
                false
            }
        };
        metrics::record_rpc_health(healthy);
        healthy
    }

    pub fn primary_url(&self) -> &url::Url {
        &self.primary_url
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_duration
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &(self.providers.len() - 1))
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
