//! Patent novelty ledger client.
//!
//! Evaluates a document with an external novelty service, pins the result to
//! content-addressed storage, and records `(cid, score, decision)` on an EVM
//! ledger that accepts each content identifier at most once.

pub mod config;
pub mod evaluation;
pub mod ledger;
pub mod observability;
pub mod workflow;

pub use config::AppConfig;
pub use ledger::{LedgerClient, WalletSession};
pub use workflow::{EvaluationOrchestrator, SubmissionController, SubmissionStatus};
