//! Evaluation and storage collaborators.
//!
//! # Data Flow
//! ```text
//! document bytes
//!     → backend.rs (POST /upload/, multipart) → EvaluationReport
//!     → storage.rs (backend /upload_ipfs/ or Pinata) → ContentId
//!     → types.rs (EvaluationResult handed to the submission workflow)
//! ```

pub mod backend;
pub mod judgment;
pub mod storage;
pub mod types;

pub use backend::{EvaluationBackend, HttpEvaluationBackend};
pub use judgment::Judgment;
pub use storage::{extract_cid, BackendStorageUploader, PinataUploader, StorageUploader};
pub use types::{
    similarity_percent, ContentId, Decision, EvaluationReport, EvaluationResult, MatchedPatent,
    UpstreamError,
};
