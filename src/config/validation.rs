//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that each store kind has the settings it needs
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Redirect rules themselves are not validated; malformed patterns are
//!   tolerated at match time

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{RedirectorConfig, StoreKind};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
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

/// Validate a parsed configuration.
pub fn validate_config(config: &RedirectorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    let store = &config.store;
    if store.key.is_empty() {
        errors.push(ValidationError::new("store.key", "must not be empty"));
    }
    if store.refresh_interval_secs == 0 {
        errors.push(ValidationError::new("store.refresh_interval_secs", "must be greater than 0"));
    }
    if store.fetch_timeout_secs == 0 {
        errors.push(ValidationError::new("store.fetch_timeout_secs", "must be greater than 0"));
    }
    match store.kind {
        StoreKind::Inline => {}
        StoreKind::File => {
            if store.path.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::new("store.path", "required for the file store"));
            }
        }
        StoreKind::Http => match store.endpoint.as_deref() {
            None | Some("") => {
                errors.push(ValidationError::new("store.endpoint", "required for the http store"));
            }
            Some(endpoint) => match url::Url::parse(endpoint) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => errors.push(ValidationError::new(
                    "store.endpoint",
                    format!("unsupported scheme '{}'", url.scheme()),
                )),
                Err(e) => errors.push(ValidationError::new("store.endpoint", e.to_string())),
            },
        },
    }

    for (i, prefix) in config.interception.exclude_prefixes.iter().enumerate() {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                &format!("interception.exclude_prefixes[{}]", i),
                format!("'{}' must start with '/'", prefix),
            ));
        }
    }

    if let Some(address) = config.upstream.address.as_deref() {
        if url::Url::parse(&format!("http://{}", address)).is_err() || address.contains('/') {
            errors.push(ValidationError::new(
                "upstream.address",
                format!("'{}' is not a host:port authority", address),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "required when admin is enabled"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", value)));
    }
}
