//! Configuration validation.
//!
//! Serde handles syntax; this module checks that values make sense before
//! any component is built from them. All problems are reported at once.

use alloy::primitives::Address;
use std::fmt;

use crate::blockchain::units::parse_ether;
use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the whole configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "node.http_url", &config.node.http_url, &["http", "https"]);
    if !config.node.ws_url.is_empty() {
        check_url(&mut errors, "node.ws_url", &config.node.ws_url, &["ws", "wss"]);
    }
    if config.node.chain_id == 0 {
        errors.push(ValidationError::new("node.chain_id", "must be non-zero"));
    }
    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be non-zero"));
    }
    if config.node.ws_connect_timeout_secs == 0 {
        errors.push(ValidationError::new("node.ws_connect_timeout_secs", "must be non-zero"));
    }

    let transfer = &config.transfer;
    if transfer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("transfer.private_key_env", "must name an environment variable"));
    }
    if let Err(e) = transfer.to_address.parse::<Address>() {
        errors.push(ValidationError::new("transfer.to_address", format!("invalid address: {}", e)));
    }
    if let Err(e) = parse_ether(&transfer.amount_eth) {
        errors.push(ValidationError::new("transfer.amount_eth", e.to_string()));
    }
    if transfer.gas_limit < 21_000 {
        errors.push(ValidationError::new("transfer.gas_limit", "must be at least 21000"));
    }
    if transfer.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new("transfer.receipt_poll_interval_ms", "must be non-zero"));
    }

    let observer = &config.observer;
    for (i, account) in observer.watched_accounts.iter().enumerate() {
        if let Err(e) = account.parse::<Address>() {
            errors.push(ValidationError::new(
                &format!("observer.watched_accounts[{}]", i),
                format!("invalid address '{}': {}", account, e),
            ));
        }
    }
    for (field, value) in [
        ("observer.poll_interval_secs", observer.poll_interval_secs),
        ("observer.error_backoff_secs", observer.error_backoff_secs),
        ("observer.balance_interval_secs", observer.balance_interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be non-zero"));
        }
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::new("observability.metrics_address", "must be host:port"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str, schemes: &[&str]) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', expected one of {:?}", url.scheme(), schemes),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
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
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.node.http_url = "not a url".to_string();
        config.node.chain_id = 0;
        config.transfer.amount_eth = "lots".to_string();
        config.observer.watched_accounts.push("0x1234".to_string());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "node.http_url",
                "node.chain_id",
                "transfer.amount_eth",
                "observer.watched_accounts[3]",
            ]
        );
    }

    #[test]
    fn test_ws_scheme_checked() {
        let mut config = AppConfig::default();
        config.node.ws_url = "http://localhost:8546".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unsupported scheme"));
    }

    #[test]
    fn test_zero_ws_connect_timeout_rejected() {
        let mut config = AppConfig::default();
        config.node.ws_connect_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "node.ws_connect_timeout_secs");
    }

    #[test]
    fn test_empty_ws_url_allowed() {
        let mut config = AppConfig::default();
        config.node.ws_url.clear();
        assert!(validate_config(&config).is_ok());
    }
}
