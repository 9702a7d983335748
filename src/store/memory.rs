//! In-memory rule store.
//!
//! Backs the inline `store.rules` config section and is handy in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{RuleStore, StoreError};
use crate::routing::RedirectRule;

/// In-memory rule store keyed like the remote config service.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    items: RwLock<HashMap<String, Vec<RedirectRule>>>,
}

impl MemoryRuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rules` under `key`.
    pub fn with_rules(key: &str, rules: Vec<RedirectRule>) -> Self {
        let store = Self::new();
        store.set(key, rules);
        store
    }

    /// Replace the rules under `key`.
    pub fn set(&self, key: &str, rules: Vec<RedirectRule>) {
        self.items
            .write()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), rules);
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<RedirectRule>>, StoreError> {
        Ok(self
            .items
            .read()
            .expect("memory store lock poisoned")
            .get(key)
            .cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_fetch() {
        let store = MemoryRuleStore::new();
        assert_eq!(store.fetch("redirectRules").await.unwrap(), None);

        store.set("redirectRules", vec![RedirectRule::new("/a", "/b", false)]);
        let rules = store.fetch("redirectRules").await.unwrap().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(store.fetch("otherKey").await.unwrap(), None);

        store.set("redirectRules", Vec::new());
        assert_eq!(store.fetch("redirectRules").await.unwrap(), Some(Vec::new()));
    }
}
