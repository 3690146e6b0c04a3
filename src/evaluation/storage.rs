//! Content-addressed storage uploaders.
//!
//! Every uploader funnels its response through [`extract_cid`], which refuses
//! anything but a non-empty string identifier.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::StorageConfig;
use crate::evaluation::backend::{join_url, transport_error};
use crate::evaluation::types::{ContentId, EvaluationReport, UpstreamError};
use crate::observability::metrics;

/// Environment variable holding the Pinata API key.
pub const PINATA_API_KEY_ENV_VAR: &str = "PINATA_API_KEY";
/// Environment variable holding the Pinata API secret.
pub const PINATA_SECRET_ENV_VAR: &str = "PINATA_SECRET_API_KEY";

/// Pins an evaluation payload and returns its content identifier.
#[async_trait]
pub trait StorageUploader: Send + Sync {
    async fn upload(&self, report: &EvaluationReport) -> Result<ContentId, UpstreamError>;
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Pull the content identifier at `field` out of an uploader response.
pub fn extract_cid(
    service: &'static str,
    body: &Value,
    field: &str,
) -> Result<ContentId, UpstreamError> {
    let malformed = |message: String| UpstreamError::Malformed { service, message };

    match body.get(field) {
        Some(Value::String(cid)) if !cid.trim().is_empty() => Ok(ContentId::new(cid.clone())),
        Some(Value::String(_)) => Err(malformed(format!("'{}' is empty", field))),
        Some(other) => Err(malformed(format!(
            "'{}' is {}, expected a string",
            field,
            json_kind(other)
        ))),
        None => match body.get("error").and_then(Value::as_str) {
            Some(error) => Err(malformed(format!(
                "no '{}' in response (upstream error: {})",
                field, error
            ))),
            None => Err(malformed(format!("no '{}' in response", field))),
        },
    }
}

async fn read_json(service: &'static str, resp: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }
    resp.json().await.map_err(|e| UpstreamError::Decode {
        service,
        message: e.to_string(),
    })
}

fn build_client(service: &'static str, timeout_secs: u64) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| UpstreamError::Http {
            service,
            message: format!("failed to build http client: {e}"),
        })
}

/// Uploads through the evaluation service's `/upload_ipfs/` route.
#[derive(Debug, Clone)]
pub struct BackendStorageUploader {
    client: reqwest::Client,
    base_url: String,
}

impl BackendStorageUploader {
    const SERVICE: &'static str = "storage";

    pub fn new(base_url: &str, config: &StorageConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(Self::SERVICE, config.timeout_secs)?,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl StorageUploader for BackendStorageUploader {
    async fn upload(&self, report: &EvaluationReport) -> Result<ContentId, UpstreamError> {
        let url = join_url(&self.base_url, "upload_ipfs/");
        let result = async {
            let resp = self
                .client
                .post(&url)
                .json(report)
                .send()
                .await
                .map_err(|e| transport_error(Self::SERVICE, e))?;
            let body = read_json(Self::SERVICE, resp).await?;
            extract_cid(Self::SERVICE, &body, "cid")
        }
        .await;

        match &result {
            Ok(cid) => {
                metrics::record_upstream(Self::SERVICE, "ok");
                tracing::info!(cid = %cid, "Evaluation result pinned");
            }
            Err(e) => {
                metrics::record_upstream(Self::SERVICE, "error");
                tracing::warn!(error = %e, "Pinning failed");
            }
        }
        result
    }
}

/// Uploads directly to Pinata's JSON pinning API.
#[derive(Clone)]
pub struct PinataUploader {
    client: reqwest::Client,
    url: String,
    api_key: String,
    secret_api_key: String,
    cid_version: u8,
}

impl PinataUploader {
    const SERVICE: &'static str = "pinata";

    pub fn new(
        config: &StorageConfig,
        api_key: String,
        secret_api_key: String,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: build_client(Self::SERVICE, config.timeout_secs)?,
            url: config.pinata_url.clone(),
            api_key,
            secret_api_key,
            cid_version: config.cid_version,
        })
    }

    /// Read `PINATA_API_KEY` and `PINATA_SECRET_API_KEY` from the environment.
    pub fn from_env(config: &StorageConfig) -> Result<Self, UpstreamError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| UpstreamError::Credentials(format!("{} not set", name)))
        };
        let api_key = read(PINATA_API_KEY_ENV_VAR)?;
        let secret = read(PINATA_SECRET_ENV_VAR)?;
        Self::new(config, api_key, secret)
    }

    fn payload(&self, report: &EvaluationReport) -> Value {
        json!({
            "pinataOptions": { "cidVersion": self.cid_version },
            "pinataContent": report,
        })
    }
}

impl std::fmt::Debug for PinataUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataUploader")
            .field("url", &self.url)
            .field("cid_version", &self.cid_version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageUploader for PinataUploader {
    async fn upload(&self, report: &EvaluationReport) -> Result<ContentId, UpstreamError> {
        let result = async {
            let resp = self
                .client
                .post(&self.url)
                .header("pinata_api_key", &self.api_key)
                .header("pinata_secret_api_key", &self.secret_api_key)
                .json(&self.payload(report))
                .send()
                .await
                .map_err(|e| transport_error(Self::SERVICE, e))?;
            let body = read_json(Self::SERVICE, resp).await?;
            extract_cid(Self::SERVICE, &body, "IpfsHash")
        }
        .await;

        match &result {
            Ok(cid) => {
                metrics::record_upstream(Self::SERVICE, "ok");
                tracing::info!(cid = %cid, "Evaluation result pinned to Pinata");
            }
            Err(e) => {
                metrics::record_upstream(Self::SERVICE, "error");
                tracing::warn!(error = %e, "Pinata upload failed");
            }
        }
        result
    }
}
