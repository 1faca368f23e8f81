//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::DevConfig;
use crate::discovery::listen_addr;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("watch.poll_interval_ms must be greater than zero")]
    ZeroPollInterval,

    #[error("bind.fallback_address {0:?} is not a listen address")]
    InvalidFallbackAddress(String),

    #[error("bind.fallback_host must not be empty")]
    EmptyFallbackHost,

    #[error("bind.discovery_endpoint {0:?} is not a URL")]
    InvalidDiscoveryEndpoint(String),

    #[error("serve.app_name must be a single non-empty path segment")]
    InvalidAppName,

    #[error("serve.bootstrap_global {0:?} is not a script identifier")]
    InvalidBootstrapGlobal(String),
}

/// Check a configuration for semantic problems.
pub fn validate_config(config: &DevConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.watch.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if listen_addr(&config.bind.fallback_address).is_err() {
        errors.push(ValidationError::InvalidFallbackAddress(
            config.bind.fallback_address.clone(),
        ));
    }

    if config.bind.fallback_host.trim().is_empty() {
        errors.push(ValidationError::EmptyFallbackHost);
    }

    if url::Url::parse(&config.bind.discovery_endpoint).is_err() {
        errors.push(ValidationError::InvalidDiscoveryEndpoint(
            config.bind.discovery_endpoint.clone(),
        ));
    }

    let app = &config.serve.app_name;
    if app.is_empty() || app.contains('/') || app == "." || app == ".." {
        errors.push(ValidationError::InvalidAppName);
    }

    if !is_identifier(&config.serve.bootstrap_global) {
        errors.push(ValidationError::InvalidBootstrapGlobal(
            config.serve.bootstrap_global.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
