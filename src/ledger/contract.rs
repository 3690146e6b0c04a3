//! `storeResult` against the deployed contract over JSON-RPC.
//!
//! # Responsibilities
//! - Bind the contract ABI
//! - Sign and broadcast with the identity's local key
//! - Monitor confirmations
//! - Recover the revert reason of a mined failure, so a cid raced in by
//!   another sender still reads as a duplicate

use std::sync::Arc;
use std::time::Duration;

use alloy::eips::BlockId;
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use alloy::sol_types::decode_revert_reason;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::{interval, timeout};

use crate::ledger::client::LedgerBackend;
use crate::ledger::rpc::RpcClient;
use crate::ledger::types::{LedgerFault, StoreResultCall};
use crate::ledger::wallet::SigningIdentity;

sol! {
    /// Result registry. Reverts with "CID already recorded" on a repeated cid.
    #[sol(rpc)]
    contract PatentVerifier {
        function storeResult(string cid, uint256 score, string decision) external;
    }
}

/// Fallback reason when a mined revert cannot be replayed.
const UNKNOWN_REVERT: &str = "transaction reverted";

/// A broadcast call kept until its confirmation resolves.
#[derive(Debug, Clone)]
struct SentCall {
    sender: Address,
    call: StoreResultCall,
}

/// Ledger backend that calls the deployed `PatentVerifier` contract.
#[derive(Debug, Clone)]
pub struct ContractLedger {
    rpc: RpcClient,
    contract_address: Address,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    sent: Arc<DashMap<TxHash, SentCall>>,
}

impl ContractLedger {
    pub fn new(rpc: RpcClient) -> Result<Self, LedgerFault> {
        let config = rpc.config();
        let contract_address: Address = config.contract_address.parse().map_err(|e| {
            LedgerFault::Config(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let confirmation_timeout = Duration::from_secs(config.confirmation_timeout_secs);

        Ok(Self {
            rpc,
            contract_address,
            poll_interval,
            confirmation_timeout,
            sent: Arc::new(DashMap::new()),
        })
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }
}

#[async_trait]
impl LedgerBackend for ContractLedger {
    async fn send_store_result(
        &self,
        identity: &SigningIdentity,
        call: StoreResultCall,
    ) -> Result<TxHash, LedgerFault> {
        let signer = identity.signer().cloned().ok_or_else(|| {
            LedgerFault::Signing(format!(
                "identity {} has no local key to sign with",
                identity.address()
            ))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc.primary_url().clone());
        let contract = PatentVerifier::new(self.contract_address, provider);
        let sent = SentCall {
            sender: identity.address(),
            call: call.clone(),
        };

        // Gas estimation runs inside `send`, so a duplicate cid reverts here
        // before anything is broadcast.
        let builder = contract.storeResult(call.cid, call.score, call.decision);
        let pending = match timeout(self.rpc.timeout(), builder.send()).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => return Err(LedgerFault::Rpc(e.to_string())),
            Err(_) => return Err(LedgerFault::Timeout(self.rpc.timeout().as_secs())),
        };

        let tx_hash = *pending.tx_hash();
        self.sent.insert(tx_hash, sent);
        tracing::info!(
            tx_hash = %tx_hash,
            contract = %self.contract_address,
            "storeResult broadcast"
        );
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), LedgerFault> {
        let outcome = match timeout(self.confirmation_timeout, self.poll_confirmation(tx_hash)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LedgerFault::ConfirmationTimeout(
                self.confirmation_timeout.as_secs(),
            )),
        };
        self.sent.remove(&tx_hash);
        outcome
    }
}

impl ContractLedger {
    /// Poll receipts until `confirmation_blocks` is reached.
    /// The inclusion block counts as the first confirmation.
    async fn poll_confirmation(&self, tx_hash: TxHash) -> Result<(), LedgerFault> {
        let required_confirmations = self.rpc.config().confirmation_blocks.max(1);
        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match self.rpc.get_transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.status() {
                let reason = self.revert_reason(tx_hash, receipt.block_number).await;
                tracing::warn!(tx_hash = %tx_hash, reason = %reason, "Transaction reverted");
                return Err(LedgerFault::Reverted(reason));
            }

            let current_block = self.rpc.get_block_number().await?;
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

            if confirmations >= required_confirmations {
                tracing::info!(
                    tx_hash = %tx_hash,
                    block_number = tx_block,
                    "Transaction confirmed"
                );
                return Ok(());
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = required_confirmations,
                "Waiting for confirmations"
            );
        }
    }

    /// Replay a reverted `storeResult` as a call at its inclusion block.
    ///
    /// Receipts carry no revert data; the replay hits the same contract state
    /// and returns the reason.
    async fn revert_reason(&self, tx_hash: TxHash, block: Option<u64>) -> String {
        let Some(sent) = self.sent.get(&tx_hash).map(|entry| entry.value().clone()) else {
            return UNKNOWN_REVERT.to_string();
        };

        let provider = ProviderBuilder::new().connect_http(self.rpc.primary_url().clone());
        let contract = PatentVerifier::new(self.contract_address, provider);
        let mut replay = contract
            .storeResult(sent.call.cid, sent.call.score, sent.call.decision)
            .from(sent.sender);
        if let Some(number) = block {
            replay = replay.block(BlockId::number(number));
        }

        match timeout(self.rpc.timeout(), replay.call()).await {
            Ok(Err(e)) => {
                let decoded = e.as_revert_data().and_then(|data| decode_revert_reason(&data));
                revert_message(decoded, &e.to_string())
            }
            Ok(Ok(_)) => {
                tracing::debug!(tx_hash = %tx_hash, "Replay of reverted transaction succeeded");
                UNKNOWN_REVERT.to_string()
            }
            Err(_) => UNKNOWN_REVERT.to_string(),
        }
    }
}

/// Revert text for a replayed failure: the decoded reason when there is one,
/// otherwise the raw RPC error, which usually embeds it.
fn revert_message(decoded: Option<String>, raw: &str) -> String {
    match decoded {
        Some(reason) => format!("execution reverted: {}", reason),
        None => raw.to_string(),
    }
}
