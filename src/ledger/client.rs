//! The single ledger write, `storeResult`, and outcome classification.
//!
//! Backends report raw [`LedgerFault`]s. This module is the only place that
//! reads failure text; everything above it sees a [`SubmissionError`].

use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;

use crate::ledger::types::{LedgerFault, StoreResultCall, SubmissionError, TxHash};
use crate::ledger::wallet::SigningIdentity;

/// Revert text the ledger uses when a content identifier is already recorded.
pub const DUPLICATE_REVERT_MARKER: &str = "CID already recorded";

/// A ledger that can record evaluation results.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Sign and broadcast `storeResult`. Resolves once the transaction has a hash.
    async fn send_store_result(
        &self,
        identity: &SigningIdentity,
        call: StoreResultCall,
    ) -> Result<TxHash, LedgerFault>;

    /// Resolve once `tx_hash` is included and confirmed.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), LedgerFault>;
}

/// Floor a score to the ledger's unsigned integer type.
///
/// Negative and non-finite scores record as zero.
pub fn marshal_score(score: f64) -> U256 {
    if !score.is_finite() || score <= 0.0 {
        return U256::ZERO;
    }
    U256::from(score.floor() as u128)
}

/// Map failure text to a submission error.
pub fn classify_failure(message: &str) -> SubmissionError {
    if message.contains(DUPLICATE_REVERT_MARKER) {
        SubmissionError::Duplicate
    } else {
        SubmissionError::Rejected(message.to_string())
    }
}

fn classify_fault(fault: &LedgerFault) -> SubmissionError {
    classify_failure(&fault.to_string())
}

/// Client for the `storeResult` write.
#[derive(Clone)]
pub struct LedgerClient {
    backend: Arc<dyn LedgerBackend>,
}

impl LedgerClient {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    /// Submit `(content_id, score, decision)` to the ledger.
    ///
    /// `score` is floored before submission; `content_id` and `decision` are
    /// passed through untouched.
    pub async fn store_result(
        &self,
        identity: &SigningIdentity,
        content_id: &str,
        score: f64,
        decision: &str,
    ) -> Result<PendingSubmission, SubmissionError> {
        let call = StoreResultCall {
            cid: content_id.to_string(),
            score: marshal_score(score),
            decision: decision.to_string(),
        };

        tracing::debug!(
            cid = %call.cid,
            score = %call.score,
            decision = %call.decision,
            sender = %identity.address(),
            "Sending storeResult"
        );

        match self.backend.send_store_result(identity, call).await {
            Ok(hash) => Ok(PendingSubmission {
                hash,
                backend: Arc::clone(&self.backend),
            }),
            Err(fault) => {
                let classified = classify_fault(&fault);
                tracing::warn!(error = %fault, classified = ?classified, "storeResult send failed");
                Err(classified)
            }
        }
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient").finish_non_exhaustive()
    }
}

/// A broadcast transaction awaiting confirmation.
pub struct PendingSubmission {
    hash: TxHash,
    backend: Arc<dyn LedgerBackend>,
}

impl PendingSubmission {
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Wait for inclusion and confirmation.
    pub async fn wait(self) -> Result<TxHash, SubmissionError> {
        match self.backend.wait_for_confirmation(self.hash).await {
            Ok(()) => Ok(self.hash),
            Err(fault) => {
                let classified = classify_fault(&fault);
                tracing::warn!(tx_hash = %self.hash, error = %fault, "Confirmation failed");
                Err(classified)
            }
        }
    }
}

impl std::fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}
