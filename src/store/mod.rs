//! Redirect rule storage backends.
//!
//! Rules live in an external key-value configuration store under a fixed key.
//! This module abstracts that store so the refresh cache can read from
//! inline config, a JSON file, or a remote config service interchangeably.
//!
//! # Built-in Implementations
//!
//! - [`MemoryRuleStore`] - In-memory rules (inline config, tests)
//! - [`FileRuleStore`] - JSON document on disk
//! - [`HttpRuleStore`] - Remote config service over HTTP
//!
//! # Data Flow
//! ```text
//! RuleStore::fetch(key)
//!     → RuleCache::refresh (timeout, error → empty snapshot)
//!     → ArcSwap<RuleSnapshot>
//!     → request path reads the snapshot lock-free
//! ```

mod cache;
mod file;
mod http;
mod memory;

pub use cache::{spawn_refresh_task, FetchStatus, RuleCache, RuleSnapshot};
pub use file::FileRuleStore;
pub use http::HttpRuleStore;
pub use memory::MemoryRuleStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{StoreConfig, StoreKind};
use crate::routing::RedirectRule;

/// Rule store error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading a local store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value is not a rule list.
    #[error("invalid rule document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Transport failure talking to a remote store.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store answered with an unexpected status.
    #[error("store returned status {0}")]
    Status(u16),

    /// Fetch did not complete in time.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// Store settings are incomplete or invalid.
    #[error("store misconfigured: {0}")]
    Misconfigured(String),
}

/// Source of redirect rules.
///
/// `Ok(None)` means the key is absent, which callers treat the same as an
/// empty list.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch the rule list stored under `key`.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<RedirectRule>>, StoreError>;

    /// Backend name for logging and metrics.
    fn name(&self) -> &'static str;
}

/// A shared rule store.
pub type BoxRuleStore = Arc<dyn RuleStore>;

/// Build the store described by `config`.
pub fn from_config(config: &StoreConfig) -> Result<BoxRuleStore, StoreError> {
    let store: BoxRuleStore = match config.kind {
        StoreKind::Inline => Arc::new(MemoryRuleStore::with_rules(&config.key, config.rules.clone())),
        StoreKind::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| StoreError::Misconfigured("file store needs a path".into()))?;
            Arc::new(FileRuleStore::new(path))
        }
        StoreKind::Http => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| StoreError::Misconfigured("http store needs an endpoint".into()))?;
            Arc::new(HttpRuleStore::new(
                endpoint,
                config.token.clone(),
                Duration::from_secs(config.fetch_timeout_secs),
            )?)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Status(503);
        assert_eq!(err.to_string(), "store returned status 503");

        let err = StoreError::Misconfigured("missing path".to_string());
        assert!(err.to_string().contains("missing path"));
    }

    #[tokio::test]
    async fn test_from_config_inline() {
        let config = StoreConfig {
            rules: vec![RedirectRule::new("/a", "/b", true)],
            ..Default::default()
        };
        let store = from_config(&config).unwrap();
        assert_eq!(store.name(), "memory");

        let rules = store.fetch(&config.key).await.unwrap().unwrap();
        assert_eq!(rules, config.rules);
    }

    #[test]
    fn test_from_config_requires_settings() {
        let config = StoreConfig {
            kind: StoreKind::File,
            ..Default::default()
        };
        assert!(matches!(from_config(&config), Err(StoreError::Misconfigured(_))));

        let config = StoreConfig {
            kind: StoreKind::Http,
            ..Default::default()
        };
        assert!(matches!(from_config(&config), Err(StoreError::Misconfigured(_))));
    }
}
