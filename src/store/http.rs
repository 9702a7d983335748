//! Remote config service rule store.
//!
//! Reads a single item with `GET {endpoint}/item/{key}`. The response body is
//! the item value as JSON; a `404` or a JSON `null` means the key is absent.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use super::{RuleStore, StoreError};
use crate::routing::RedirectRule;

/// HTTP-backed rule store.
#[derive(Debug, Clone)]
pub struct HttpRuleStore {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpRuleStore {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Misconfigured(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Misconfigured(format!(
                "endpoint '{}' cannot carry a path",
                endpoint
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    /// URL of the item stored under `key`.
    pub fn item_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("item").push(key);
        }
        url
    }
}

#[async_trait]
impl RuleStore for HttpRuleStore {
    async fn fetch(&self, key: &str) -> Result<Option<Vec<RedirectRule>>, StoreError> {
        let mut request = self.client.get(self.item_url(key));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.bytes().await?;
                Ok(serde_json::from_slice::<Option<Vec<RedirectRule>>>(&body)?)
            }
            status => Err(StoreError::Status(status.as_u16())),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::{extract::Path, routing::get, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/ecfg_test", addr)
    }

    async fn item(Path(key): Path<String>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        match key.as_str() {
            "redirectRules" => Ok(Json(json!([
                {"source": "/old/:id", "destination": "/new/:id", "permanent": true}
            ]))),
            "nullRules" => Ok(Json(Value::Null)),
            "broken" => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    fn test_router() -> Router {
        Router::new().route("/ecfg_test/item/{key}", get(item))
    }

    #[test]
    fn test_item_url() {
        let store = HttpRuleStore::new("https://config.example.com/ecfg_1/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.item_url("redirectRules").as_str(),
            "https://config.example.com/ecfg_1/item/redirectRules"
        );

        assert!(HttpRuleStore::new("mailto:ops@example.com", None, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_rules() {
        let endpoint = serve(test_router()).await;
        let store = HttpRuleStore::new(&endpoint, Some("secret".into()), Duration::from_secs(5)).unwrap();

        let rules = store.fetch("redirectRules").await.unwrap().unwrap();
        assert_eq!(rules, vec![RedirectRule::new("/old/:id", "/new/:id", true)]);
        assert_eq!(store.fetch("nullRules").await.unwrap(), None);
        assert_eq!(store.fetch("unknown").await.unwrap(), None);
        assert!(matches!(store.fetch("broken").await, Err(StoreError::Status(500))));
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let endpoint = serve(test_router()).await;
        let store = HttpRuleStore::new(&endpoint, None, Duration::from_secs(5)).unwrap();
        assert!(matches!(store.fetch("redirectRules").await, Err(StoreError::Status(401))));
    }
}
