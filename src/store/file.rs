//! File-based rule store.
//!
//! Reads a JSON document on every fetch. Two layouts are accepted:
//!
//! ```json
//! [{ "source": "/old/:id", "destination": "/new/:id", "permanent": true }]
//! ```
//!
//! or an object of configuration items, where the rule list sits under the
//! configured key:
//!
//! ```json
//! { "redirectRules": [ ... ], "featureFlags": { ... } }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{RuleStore, StoreError};
use crate::routing::RedirectRule;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Rules(Vec<RedirectRule>),
    Items(HashMap<String, serde_json::Value>),
}

/// JSON file rule store.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<RedirectRule>>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await?;

        match serde_json::from_str::<Document>(&content)? {
            Document::Rules(rules) => Ok(Some(rules)),
            Document::Items(mut items) => match items.remove(key) {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
            },
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store_with(content: &str) -> (tempfile::NamedTempFile, FileRuleStore) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let store = FileRuleStore::new(file.path());
        (file, store)
    }

    #[tokio::test]
    async fn test_bare_rule_array() {
        let (_file, store) = store_with(
            r#"[{"source": "/old/:id", "destination": "/new/:id", "permanent": true}]"#,
        );
        let rules = store.fetch("redirectRules").await.unwrap().unwrap();
        assert_eq!(rules, vec![RedirectRule::new("/old/:id", "/new/:id", true)]);
    }

    #[tokio::test]
    async fn test_keyed_items() {
        let (_file, store) = store_with(
            r#"{
                "greeting": "hello",
                "redirectRules": [{"source": "/a", "destination": "/b", "permanent": false}],
                "emptyRules": null
            }"#,
        );

        let rules = store.fetch("redirectRules").await.unwrap().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(store.fetch("missing").await.unwrap(), None);
        assert_eq!(store.fetch("emptyRules").await.unwrap(), None);
        assert!(matches!(store.fetch("greeting").await, Err(StoreError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = FileRuleStore::new("/nonexistent/rules.json");
        assert!(matches!(store.fetch("redirectRules").await, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let (_file, store) = store_with("not json");
        assert!(matches!(store.fetch("redirectRules").await, Err(StoreError::Parse(_))));
    }
}
