//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, poll interval > 0)
//! - Check that URLs and the contract address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `ledger.rpc_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let ledger = &config.ledger;
    if let Err(e) = ledger.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new(
            "ledger.rpc_url",
            format!("invalid URL '{}': {}", ledger.rpc_url, e),
        ));
    }
    for failover in &ledger.failover_urls {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "ledger.failover_urls",
                format!("invalid URL '{}'", failover),
            ));
        }
    }
    if ledger.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "ledger.contract_address",
            format!("'{}' is not a 20-byte hex address", ledger.contract_address),
        ));
    }
    if ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }
    if ledger.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "ledger.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.poll_interval_ms", "must be > 0"));
    }

    if config.evaluator.base_url.trim().is_empty() {
        errors.push(ValidationError::new("evaluator.base_url", "must not be empty"));
    } else if config.evaluator.base_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "evaluator.base_url",
            format!("invalid URL '{}'", config.evaluator.base_url),
        ));
    }
    if config.evaluator.timeout_secs == 0 {
        errors.push(ValidationError::new("evaluator.timeout_secs", "must be > 0"));
    }

    if config.storage.pinata_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "storage.pinata_url",
            format!("invalid URL '{}'", config.storage.pinata_url),
        ));
    }
    if !matches!(config.storage.cid_version, 0 | 1) {
        errors.push(ValidationError::new("storage.cid_version", "must be 0 or 1"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.ledger.rpc_url = "not a url".to_string();
        config.ledger.contract_address = "0x1234".to_string();
        config.ledger.poll_interval_ms = 0;
        config.evaluator.base_url = "  ".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "ledger.rpc_url",
                "ledger.contract_address",
                "ledger.poll_interval_ms",
                "evaluator.base_url",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
