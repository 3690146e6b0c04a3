//! Ledger-facing types and error definitions.

use alloy::primitives::U256;
use thiserror::Error;

pub use alloy::primitives::TxHash;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Raw failures reported by a ledger backend, before classification.
///
/// Only `LedgerClient` looks inside these; the rest of the crate sees
/// [`SubmissionError`].
#[derive(Debug, Error)]
pub enum LedgerFault {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// The identity cannot produce a signature.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Backend misconfigured (bad contract address, bad URL).
    #[error("Ledger configuration error: {0}")]
    Config(String),
}

/// Classified outcome of a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The ledger already holds a result for this content identifier.
    #[error("content identifier already recorded")]
    Duplicate,

    /// Any other failure: network, gas, user cancellation, unclassified revert.
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Marshalled arguments of one `storeResult` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResultCall {
    pub cid: String,
    pub score: U256,
    pub decision: String,
}
