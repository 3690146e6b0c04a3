//! Novelty evaluation backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::config::EvaluatorConfig;
use crate::evaluation::types::{EvaluationReport, UpstreamError};
use crate::observability::metrics;

const SERVICE: &str = "evaluator";

/// Evaluates a document for novelty.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    async fn evaluate(
        &self,
        file_name: &str,
        document: Vec<u8>,
    ) -> Result<EvaluationReport, UpstreamError>;
}

/// Join a base URL and a route without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

pub(crate) fn transport_error(service: &'static str, e: reqwest::Error) -> UpstreamError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    UpstreamError::Http { service, message }
}

/// HTTP client for the evaluation service's multipart `/upload/` route.
#[derive(Debug, Clone)]
pub struct HttpEvaluationBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEvaluationBackend {
    pub fn new(config: &EvaluatorConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Http {
                service: SERVICE,
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl EvaluationBackend for HttpEvaluationBackend {
    async fn evaluate(
        &self,
        file_name: &str,
        document: Vec<u8>,
    ) -> Result<EvaluationReport, UpstreamError> {
        let url = join_url(&self.base_url, "upload/");
        let size = document.len();
        let part = Part::bytes(document)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| transport_error(SERVICE, e))?;
        let form = Form::new().part("file", part);

        tracing::info!(url = %url, file = %file_name, bytes = size, "Submitting document for evaluation");

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream(SERVICE, "error");
                transport_error(SERVICE, e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            metrics::record_upstream(SERVICE, "error");
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let report: EvaluationReport = resp.json().await.map_err(|e| {
            metrics::record_upstream(SERVICE, "error");
            UpstreamError::Decode {
                service: SERVICE,
                message: e.to_string(),
            }
        })?;

        metrics::record_upstream(SERVICE, "ok");
        tracing::info!(
            is_unique = report.is_unique,
            uniqueness_score = report.uniqueness_score,
            "Evaluation complete"
        );
        Ok(report)
    }
}
