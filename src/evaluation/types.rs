//! Evaluation payloads and the result handed to the ledger.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::evaluation::judgment::Judgment;

/// Errors from the evaluation backend or the storage uploader.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("{service} request failed: {message}")]
    Http {
        service: &'static str,
        message: String,
    },

    /// Non-success HTTP status.
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Body was not the JSON shape we expect.
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Response decoded but lacks a usable content identifier.
    #[error("malformed response from {service}: {message}")]
    Malformed {
        service: &'static str,
        message: String,
    },

    /// Required API credentials are not configured.
    #[error("missing credentials: {0}")]
    Credentials(String),

    /// The document to evaluate could not be read.
    #[error("cannot read document {path}: {message}")]
    Document { path: String, message: String },
}

/// Content-addressed reference returned by the storage uploader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Categorical novelty decision recorded on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Unique,
    NotUnique,
}

impl Decision {
    /// Wire string passed to `storeResult`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Unique => "Unique",
            Decision::NotUnique => "NotUnique",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unique" | "unique" => Ok(Decision::Unique),
            "NotUnique" | "not-unique" | "notunique" => Ok(Decision::NotUnique),
            other => Err(format!("unknown decision '{}'", other)),
        }
    }
}

/// Closest prior document found by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPatent {
    pub filename: String,
    pub similarity_score: f64,
}

/// Response of the evaluation backend.
///
/// Fields this crate does not interpret are kept in `extra` so the full
/// payload reaches the storage uploader unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub is_unique: bool,
    pub uniqueness_score: f64,
    #[serde(default)]
    pub agent_judgment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_patent: Option<MatchedPatent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvaluationReport {
    pub fn judgment(&self) -> Judgment {
        Judgment::from_code(&self.agent_judgment)
    }

    pub fn decision(&self) -> Decision {
        if self.is_unique {
            Decision::Unique
        } else {
            Decision::NotUnique
        }
    }

    /// Display similarity, in percent.
    pub fn similarity_percent(&self) -> f64 {
        similarity_percent(self.uniqueness_score)
    }
}

/// `(1 - min(1, score)) * 100`.
pub fn similarity_percent(uniqueness_score: f64) -> f64 {
    (1.0 - uniqueness_score.min(1.0)) * 100.0
}

/// One result, ready for a single submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    content_id: ContentId,
    score: f64,
    decision: Decision,
}

impl EvaluationResult {
    /// `score` is clamped to `0..=1`; NaN becomes 0.
    pub fn new(content_id: ContentId, score: f64, decision: Decision) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            content_id,
            score,
            decision,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }
}
