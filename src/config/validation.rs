//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ceilings and limits > 0)
//! - Reject header values that would break the forwarded request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
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

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_host.is_empty() {
        errors.push(ValidationError::new("listener.bind_host", "must not be empty"));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    let user_agent = &config.forwarding.user_agent;
    if user_agent.trim().is_empty() {
        errors.push(ValidationError::new("forwarding.user_agent", "must not be empty"));
    }
    if user_agent.contains(['\r', '\n']) {
        errors.push(ValidationError::new(
            "forwarding.user_agent",
            "must not contain CR or LF",
        ));
    }
    if config.forwarding.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "forwarding.connect_timeout_secs",
            "must be greater than 0 when set",
        ));
    }

    let limits = &config.limits;
    if limits.max_line_bytes == 0 {
        errors.push(ValidationError::new("limits.max_line_bytes", "must be greater than 0"));
    }
    if limits.max_header_count == 0 {
        errors.push(ValidationError::new("limits.max_header_count", "must be greater than 0"));
    }
    if limits.max_header_bytes < limits.max_line_bytes {
        errors.push(ValidationError::new(
            "limits.max_header_bytes",
            "must be at least limits.max_line_bytes",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
