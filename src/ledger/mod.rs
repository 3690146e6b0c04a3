//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! WalletProvider (local key, or any injected signer)
//!     → wallet.rs (WalletSession: connect, hold SigningIdentity)
//!     → client.rs (LedgerClient: marshal, send, classify)
//!     → contract.rs (ContractLedger: sign, broadcast, confirm)
//!       or memory.rs (InMemoryLedger: offline runs, tests)
//!     → rpc.rs (read-side RPC with timeouts and failover)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod memory;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use client::{classify_failure, marshal_score, LedgerBackend, LedgerClient, PendingSubmission};
pub use contract::ContractLedger;
pub use memory::InMemoryLedger;
pub use rpc::RpcClient;
pub use types::{ChainId, LedgerFault, StoreResultCall, SubmissionError, TxHash};
pub use wallet::{
    LocalKeyWallet, ProviderError, SigningIdentity, WalletError, WalletProvider, WalletSession,
};
