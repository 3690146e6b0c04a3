//! In-process ledger with the same uniqueness rule as the deployed contract.
//!
//! Used for `--offline` runs and tests. Failures can be injected for the next
//! send or confirmation wait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;

use crate::ledger::client::{LedgerBackend, DUPLICATE_REVERT_MARKER};
use crate::ledger::types::{LedgerFault, StoreResultCall, TxHash};
use crate::ledger::wallet::SigningIdentity;

/// A result recorded on the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub score: U256,
    pub decision: String,
    pub sender: Address,
    pub tx_hash: TxHash,
}

fn duplicate_revert() -> LedgerFault {
    LedgerFault::Reverted(format!("execution reverted: {}", DUPLICATE_REVERT_MARKER))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Stage {
    Send,
    Wait,
}

/// Thread-safe in-memory ledger.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    records: Arc<DashMap<String, RecordedResult>>,
    transactions: Arc<DashMap<TxHash, String>>,
    injected: Arc<DashMap<Stage, LedgerFault>>,
    nonce: Arc<AtomicU64>,
    send_calls: Arc<AtomicU64>,
    confirmation_delay: Duration,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every confirmation by `delay`, so pending states are observable.
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Look up the result recorded for `cid`.
    pub fn record(&self, cid: &str) -> Option<RecordedResult> {
        self.records.get(cid).map(|r| r.value().clone())
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of `storeResult` calls received, successful or not.
    pub fn send_calls(&self) -> u64 {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Make the next send fail with `message`.
    pub fn fail_next_send(&self, message: impl Into<String>) {
        self.injected.insert(Stage::Send, LedgerFault::Rpc(message.into()));
    }

    /// Make the next confirmation wait fail with `message`.
    pub fn fail_next_wait(&self, message: impl Into<String>) {
        self.injected.insert(Stage::Wait, LedgerFault::Rpc(message.into()));
    }

    /// Make the next confirmation wait report a mined duplicate revert, as when
    /// a racing transaction for the same cid was included first.
    pub fn revert_next_wait_as_duplicate(&self) {
        self.injected.insert(Stage::Wait, duplicate_revert());
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("records", &self.records.len())
            .field("send_calls", &self.send_calls())
            .finish()
    }
}

#[async_trait]
impl LedgerBackend for InMemoryLedger {
    async fn send_store_result(
        &self,
        identity: &SigningIdentity,
        call: StoreResultCall,
    ) -> Result<TxHash, LedgerFault> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        if let Some((_, fault)) = self.injected.remove(&Stage::Send) {
            return Err(fault);
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let tx_hash = keccak256(format!("{}:{}:{}", identity.address(), call.cid, nonce));

        // The entry API holds the shard lock, so racing sends for one cid
        // cannot both succeed.
        match self.records.entry(call.cid.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(duplicate_revert()),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(RecordedResult {
                    score: call.score,
                    decision: call.decision,
                    sender: identity.address(),
                    tx_hash,
                });
            }
        }

        self.transactions.insert(tx_hash, call.cid);
        tracing::debug!(tx_hash = %tx_hash, "In-memory ledger accepted storeResult");
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), LedgerFault> {
        if !self.confirmation_delay.is_zero() {
            tokio::time::sleep(self.confirmation_delay).await;
        }
        if let Some((_, fault)) = self.injected.remove(&Stage::Wait) {
            return Err(fault);
        }
        if self.transactions.contains_key(&tx_hash) {
            Ok(())
        } else {
            Err(LedgerFault::Rpc(format!("unknown transaction {}", tx_hash)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(cid: &str) -> StoreResultCall {
        StoreResultCall {
            cid: cid.to_string(),
            score: U256::ZERO,
            decision: "Unique".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_sender_hits_uniqueness_rule() {
        let ledger = InMemoryLedger::new();
        let alice = SigningIdentity::address_only(Address::repeat_byte(1));
        let bob = SigningIdentity::address_only(Address::repeat_byte(2));

        ledger.send_store_result(&alice, call("bafy123")).await.unwrap();
        let err = ledger.send_store_result(&bob, call("bafy123")).await.unwrap_err();

        assert!(err.to_string().contains(DUPLICATE_REVERT_MARKER));
        assert_eq!(ledger.record("bafy123").unwrap().sender, alice.address());
        assert_eq!(ledger.send_calls(), 2);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_send_failure_is_consumed_once() {
        let ledger = InMemoryLedger::new();
        let alice = SigningIdentity::address_only(Address::repeat_byte(1));
        ledger.fail_next_send("insufficient funds for gas");

        assert!(ledger.send_store_result(&alice, call("a")).await.is_err());
        assert!(ledger.is_empty());
        assert!(ledger.send_store_result(&alice, call("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_revert_injected_at_wait() {
        let ledger = InMemoryLedger::new();
        let alice = SigningIdentity::address_only(Address::repeat_byte(1));
        ledger.revert_next_wait_as_duplicate();

        let hash = ledger.send_store_result(&alice, call("bafy123")).await.unwrap();
        let err = ledger.wait_for_confirmation(hash).await.unwrap_err();
        assert!(matches!(err, LedgerFault::Reverted(ref reason) if reason.contains(DUPLICATE_REVERT_MARKER)));
    }

    #[tokio::test]
    async fn test_unknown_hash_does_not_confirm() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.wait_for_confirmation(TxHash::ZERO).await.is_err());
    }
}
