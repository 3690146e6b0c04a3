//! Client-side submission workflow.
//!
//! # Data Flow
//! ```text
//! EvaluationOrchestrator
//!     → evaluate document, pin if unique
//!     → SubmissionController.connect()
//!     → SubmissionController.submit(result)
//!         → LedgerClient.store_result → Pending → Confirmed
//!                                     ↘ Rejected | DuplicateSubmission
//! ```

pub mod controller;
pub mod orchestrator;
pub mod status;

pub use controller::{SubmissionController, SubmitOutcome, ABANDONED_REASON};
pub use orchestrator::{EvaluationOrchestrator, Prepared, RunOutcome};
pub use status::{SubmissionStatus, NOT_CONNECTED_WARNING};
