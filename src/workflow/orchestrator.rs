//! Evaluate → pin → submit.

use std::path::Path;
use std::sync::Arc;

use crate::evaluation::{
    ContentId, Decision, EvaluationBackend, EvaluationReport, EvaluationResult, StorageUploader,
    UpstreamError,
};
use crate::workflow::controller::SubmissionController;
use crate::workflow::status::SubmissionStatus;

/// Outcome of evaluation plus pinning.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    /// Not novel; nothing was pinned.
    NotUnique(EvaluationReport),
    /// Pinned and ready to submit.
    Ready {
        report: EvaluationReport,
        result: EvaluationResult,
    },
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub report: EvaluationReport,
    /// `None` when the document was not unique.
    pub result: Option<EvaluationResult>,
    pub status: SubmissionStatus,
    /// Status line as a user would see it.
    pub status_line: String,
}

/// Drives the evaluation and storage collaborators before handing off to
/// the submission controller.
#[derive(Clone)]
pub struct EvaluationOrchestrator {
    evaluator: Arc<dyn EvaluationBackend>,
    uploader: Arc<dyn StorageUploader>,
}

impl EvaluationOrchestrator {
    pub fn new(evaluator: Arc<dyn EvaluationBackend>, uploader: Arc<dyn StorageUploader>) -> Self {
        Self {
            evaluator,
            uploader,
        }
    }

    /// Evaluate a document held in memory.
    pub async fn evaluate(
        &self,
        file_name: &str,
        document: Vec<u8>,
    ) -> Result<EvaluationReport, UpstreamError> {
        self.evaluator.evaluate(file_name, document).await
    }

    /// Read and evaluate the document at `path`.
    pub async fn evaluate_file(&self, path: &Path) -> Result<EvaluationReport, UpstreamError> {
        let (file_name, document) = read_document(path).await?;
        self.evaluate(&file_name, document).await
    }

    /// Pin the full report and return its content identifier.
    pub async fn pin(&self, report: &EvaluationReport) -> Result<ContentId, UpstreamError> {
        self.uploader.upload(report).await
    }

    /// Evaluate, and pin only when the document is unique.
    pub async fn prepare(
        &self,
        file_name: &str,
        document: Vec<u8>,
    ) -> Result<Prepared, UpstreamError> {
        let report = self.evaluate(file_name, document).await?;
        if !report.is_unique {
            tracing::info!(
                uniqueness_score = report.uniqueness_score,
                "Document is not unique; skipping upload"
            );
            return Ok(Prepared::NotUnique(report));
        }

        let content_id = self.pin(&report).await?;
        let result = EvaluationResult::new(content_id, report.uniqueness_score, Decision::Unique);
        Ok(Prepared::Ready { report, result })
    }

    /// The whole workflow. Upstream failures abort before the ledger is touched;
    /// wallet and ledger outcomes end up in the returned status. A failed
    /// connect ends the run without a submit.
    pub async fn run(
        &self,
        file_name: &str,
        document: Vec<u8>,
        controller: &mut SubmissionController,
    ) -> Result<RunOutcome, UpstreamError> {
        let (report, result) = match self.prepare(file_name, document).await? {
            Prepared::NotUnique(report) => {
                return Ok(RunOutcome {
                    report,
                    result: None,
                    status: controller.status(),
                    status_line: controller.status_line(),
                });
            }
            Prepared::Ready { report, result } => (report, result),
        };

        if controller.account().is_none()
            && !matches!(controller.connect().await, SubmissionStatus::Connected(_))
        {
            // Keep the wallet failure and its notice as the outcome.
            return Ok(RunOutcome {
                report,
                result: Some(result),
                status: controller.status(),
                status_line: controller.status_line(),
            });
        }
        controller.submit(&result).await;

        Ok(RunOutcome {
            report,
            result: Some(result),
            status: controller.status(),
            status_line: controller.status_line(),
        })
    }

    /// [`run`](Self::run) for a document on disk.
    pub async fn run_file(
        &self,
        path: &Path,
        controller: &mut SubmissionController,
    ) -> Result<RunOutcome, UpstreamError> {
        let (file_name, document) = read_document(path).await?;
        self.run(&file_name, document, controller).await
    }
}

impl std::fmt::Debug for EvaluationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationOrchestrator").finish_non_exhaustive()
    }
}

async fn read_document(path: &Path) -> Result<(String, Vec<u8>), UpstreamError> {
    let document = tokio::fs::read(path)
        .await
        .map_err(|e| UpstreamError::Document {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    Ok((file_name, document))
}
