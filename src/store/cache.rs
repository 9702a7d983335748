//! Rule snapshot cache with background refresh.
//!
//! # Responsibilities
//! - Own the current rule snapshot and hand it to the request path
//! - Fetch from the configured store with a timeout
//! - Refresh on a schedule until shutdown
//!
//! # Design Decisions
//! - The snapshot is swapped atomically; readers never block
//! - A failed, timed-out, or absent fetch installs an empty snapshot, so the
//!   resolver passes every request through until the store recovers
//! - No retries inside a refresh; the next tick is the retry
//! - Every source replacement bumps a generation; a fetch that started
//!   against an older generation is discarded instead of installed

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{BoxRuleStore, StoreError};
use crate::config::{RedirectorConfig, StoreConfig};
use crate::observability::metrics;
use crate::routing::{resolve_with, RedirectRule, Resolution, SubstitutionMode};

/// Outcome of the fetch that produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum FetchStatus {
    /// No fetch has completed yet.
    Pending,
    /// Rules were loaded.
    Loaded,
    /// The key is not present in the store.
    Absent,
    /// The fetch failed; the message is kept for the admin API.
    Failed(String),
}

/// An immutable view of the rules at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSnapshot {
    pub rules: Vec<RedirectRule>,
    pub status: FetchStatus,
    /// Backend that produced the snapshot.
    pub store: &'static str,
    /// Unix seconds of the fetch that produced the snapshot.
    pub refreshed_at: Option<u64>,
}

impl RuleSnapshot {
    fn pending(store: &'static str) -> Self {
        Self {
            rules: Vec::new(),
            status: FetchStatus::Pending,
            store,
            refreshed_at: None,
        }
    }

    pub fn resolve(&self, path: &str, mode: SubstitutionMode) -> Resolution {
        resolve_with(path, Some(&self.rules), mode)
    }
}

struct RuleSource {
    store: BoxRuleStore,
    key: String,
    fetch_timeout: Duration,
    generation: u64,
}

/// Holds the current rule snapshot and refreshes it from a store.
pub struct RuleCache {
    source: RwLock<RuleSource>,
    snapshot: ArcSwap<RuleSnapshot>,
}

impl RuleCache {
    pub fn new(store: BoxRuleStore, key: impl Into<String>, fetch_timeout: Duration) -> Self {
        let snapshot = RuleSnapshot::pending(store.name());
        Self {
            source: RwLock::new(RuleSource {
                store,
                key: key.into(),
                fetch_timeout,
                generation: 0,
            }),
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Build a cache over the store described by `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let store = super::from_config(config)?;
        Ok(Self::new(
            store,
            config.key.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        ))
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        self.snapshot.load_full()
    }

    /// Resolve `path` against the current snapshot.
    pub fn resolve(&self, path: &str, mode: SubstitutionMode) -> Resolution {
        self.snapshot.load().resolve(path, mode)
    }

    /// Point the cache at a different store. Takes effect on the next refresh.
    pub fn replace_source(&self, store: BoxRuleStore, key: impl Into<String>, fetch_timeout: Duration) {
        let mut source = self.source.write().expect("rule source lock poisoned");
        let generation = source.generation + 1;
        *source = RuleSource {
            store,
            key: key.into(),
            fetch_timeout,
            generation,
        };
    }

    /// Rebuild the store from `config`.
    pub fn reconfigure(&self, config: &StoreConfig) -> Result<(), StoreError> {
        let store = super::from_config(config)?;
        self.replace_source(store, config.key.clone(), Duration::from_secs(config.fetch_timeout_secs));
        Ok(())
    }

    /// Fetch from the store and install the result as the new snapshot.
    ///
    /// If the source was replaced while the fetch was in flight, the result
    /// is dropped and the current snapshot is returned unchanged.
    pub async fn refresh(&self) -> Arc<RuleSnapshot> {
        let (store, key, fetch_timeout, generation) = {
            let source = self.source.read().expect("rule source lock poisoned");
            (
                source.store.clone(),
                source.key.clone(),
                source.fetch_timeout,
                source.generation,
            )
        };
        let name = store.name();

        let result = match tokio::time::timeout(fetch_timeout, store.fetch(&key)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(fetch_timeout)),
        };

        let (rules, status) = match result {
            Ok(Some(rules)) => {
                metrics::record_store_fetch(name, "loaded");
                tracing::debug!(store = name, key = %key, rules = rules.len(), "Redirect rules loaded");
                (rules, FetchStatus::Loaded)
            }
            Ok(None) => {
                metrics::record_store_fetch(name, "absent");
                tracing::debug!(store = name, key = %key, "No redirect rules stored");
                (Vec::new(), FetchStatus::Absent)
            }
            Err(e) => {
                metrics::record_store_fetch(name, "error");
                tracing::warn!(store = name, key = %key, error = %e, "Rule fetch failed, serving no rules");
                (Vec::new(), FetchStatus::Failed(e.to_string()))
            }
        };

        let refreshed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let snapshot = Arc::new(RuleSnapshot {
            rules,
            status,
            store: name,
            refreshed_at: Some(refreshed_at),
        });

        // Held across the swap so a concurrent replace_source cannot slip in
        let source = self.source.read().expect("rule source lock poisoned");
        if source.generation != generation {
            tracing::debug!(
                store = name,
                started = generation,
                current = source.generation,
                "Discarding fetch from a replaced rule source"
            );
            return self.snapshot();
        }
        metrics::record_rules_loaded(snapshot.rules.len());
        self.snapshot.store(snapshot.clone());
        snapshot
    }
}

/// Refresh `cache` every `store.refresh_interval_secs` until shutdown.
///
/// The interval is re-read from `config` before every tick.
pub fn spawn_refresh_task(
    cache: Arc<RuleCache>,
    config: Arc<ArcSwap<RedirectorConfig>>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let interval = Duration::from_secs(config.load().store.refresh_interval_secs.max(1));
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    cache.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rule refresh task stopping");
                    break;
                }
            }
        }
    })
}
