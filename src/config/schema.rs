//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirector.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::{RedirectRule, SubstitutionMode};

/// Root configuration for the redirector.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RedirectorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where redirect rules come from and how often they are refreshed.
    pub store: StoreConfig,

    /// Which requests are evaluated and how destinations are expanded.
    pub interception: InterceptionConfig,

    /// Where pass-through requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Rule store backend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Rules listed in this file under `store.rules`.
    #[default]
    Inline,
    /// JSON document on disk.
    File,
    /// Remote key-value config service over HTTP.
    Http,
}

/// Rule store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to read rules from.
    pub kind: StoreKind,

    /// Configuration key holding the rule list.
    pub key: String,

    /// JSON file path (file store).
    pub path: Option<String>,

    /// Base URL of the config service (http store).
    pub endpoint: Option<String>,

    /// Bearer token for the config service (http store).
    pub token: Option<String>,

    /// Seconds between background refreshes.
    pub refresh_interval_secs: u64,

    /// Timeout for a single fetch in seconds.
    pub fetch_timeout_secs: u64,

    /// Rules served by the inline store.
    pub rules: Vec<RedirectRule>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Inline,
            key: "redirectRules".to_string(),
            path: None,
            endpoint: None,
            token: None,
            refresh_interval_secs: 30,
            fetch_timeout_secs: 5,
            rules: Vec::new(),
        }
    }
}

/// Request interception settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Evaluate redirect rules at all.
    pub enabled: bool,

    /// Path prefixes that are never evaluated (API routes, static assets).
    pub exclude_prefixes: Vec<String>,

    /// Token substitution mode for destination templates.
    pub substitution: SubstitutionMode,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude_prefixes: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
            substitution: SubstitutionMode::First,
        }
    }
}

impl InterceptionConfig {
    /// Whether `path` should be handed to the resolver.
    pub fn should_intercept(&self, path: &str) -> bool {
        self.enabled && !self.exclude_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Upstream forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). Unset answers 404.
    pub address: Option<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: RedirectorConfig = toml::from_str("").unwrap();
        assert_eq!(config, RedirectorConfig::default());
        assert_eq!(config.store.key, "redirectRules");
        assert_eq!(config.store.kind, StoreKind::Inline);
    }

    #[test]
    fn test_inline_rules_from_toml() {
        let config: RedirectorConfig = toml::from_str(
            r#"
            [store]
            refresh_interval_secs = 10

            [[store.rules]]
            source = "/old/:id"
            destination = "/new/:id"
            permanent = true

            [[store.rules]]
            source = "/blog"
            destination = "/news"

            [interception]
            substitution = "all"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.refresh_interval_secs, 10);
        assert_eq!(config.store.rules.len(), 2);
        assert!(config.store.rules[0].permanent);
        assert!(!config.store.rules[1].permanent);
        assert_eq!(config.interception.substitution, SubstitutionMode::All);
        // Untouched fields keep their defaults
        assert_eq!(config.interception.exclude_prefixes.len(), 4);
    }

    #[test]
    fn test_default_exclusions() {
        let interception = InterceptionConfig::default();
        assert!(interception.should_intercept("/old/42"));
        assert!(interception.should_intercept("/"));
        assert!(!interception.should_intercept("/api/users"));
        assert!(!interception.should_intercept("/apidocs"));
        assert!(!interception.should_intercept("/_next/static/chunk.js"));
        assert!(!interception.should_intercept("/favicon.ico"));

        let disabled = InterceptionConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!disabled.should_intercept("/old/42"));
    }
}
