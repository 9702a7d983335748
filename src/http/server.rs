//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect middleware and fallback handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Keep the rule snapshot fresh and apply config reloads
//! - Forward pass-through requests to the upstream, if one is configured
//! - Serve the admin API on its own listener

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri, Version,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::RedirectorConfig;
use crate::http::middleware::redirect_middleware;
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::store::{spawn_refresh_task, BoxRuleStore, RuleCache, StoreError};

/// Liveness probe path. Never subject to redirects.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<RedirectorConfig>>,
    pub rules: Arc<RuleCache>,
    pub client: Client<HttpConnector, Body>,
    pub started_at: Instant,
}

/// HTTP server for the redirector.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server reading rules from the store named in `config`.
    pub fn new(config: RedirectorConfig) -> Result<Self, StoreError> {
        let cache = RuleCache::from_config(&config.store)?;
        Ok(Self::with_rule_cache(config, Arc::new(cache)))
    }

    /// Create a server reading rules from `store`.
    pub fn with_store(config: RedirectorConfig, store: BoxRuleStore) -> Self {
        let cache = RuleCache::new(
            store,
            config.store.key.clone(),
            Duration::from_secs(config.store.fetch_timeout_secs),
        );
        Self::with_rule_cache(config, Arc::new(cache))
    }

    fn with_rule_cache(config: RedirectorConfig, rules: Arc<RuleCache>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            config: Arc::new(ArcSwap::from_pointee(config)),
            rules,
            client,
            started_at: Instant::now(),
        };

        let router = Self::build_router(state.clone(), request_timeout);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %req.request_id(),
            )
        });

        Router::new()
            .fallback(forward_handler)
            .layer(middleware::from_fn_with_state(state.clone(), redirect_middleware))
            // Added after the redirect layer so it is never intercepted
            .route(HEALTH_PATH, get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(trace)
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// The application router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared state.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Loads the rules once before accepting traffic, then keeps them fresh in
    /// the background and applies configs arriving on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RedirectorConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        let snapshot = self.state.rules.refresh().await;
        tracing::info!(
            rules = snapshot.rules.len(),
            store = snapshot.store,
            "Initial redirect rules loaded"
        );

        spawn_refresh_task(
            self.state.rules.clone(),
            self.state.config.clone(),
            shutdown.resubscribe(),
        );
        spawn_config_updates(self.state.clone(), config_updates, shutdown.resubscribe());

        let admin = self.state.config.load().admin.clone();
        if admin.enabled {
            let admin_listener = TcpListener::bind(&admin.bind_address).await?;
            let admin_router = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin.bind_address, "Admin API starting");
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API failed");
                }
            });
        }

        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn spawn_config_updates(
    state: AppState,
    mut config_updates: mpsc::UnboundedReceiver<RedirectorConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = config_updates.recv() => match update {
                    Some(new_config) => apply_config(&state, new_config).await,
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    });
}

/// Config sections that are only read at startup and differ between `current` and `new`.
fn restart_required(current: &RedirectorConfig, new: &RedirectorConfig) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if current.listener != new.listener {
        sections.push("listener");
    }
    if current.admin != new.admin {
        sections.push("admin");
    }
    // Connector and request timeouts are baked into the client and router
    if current.timeouts != new.timeouts {
        sections.push("timeouts");
    }
    sections
}

/// Swap in a reloaded config, rebuilding the rule store if its settings changed.
pub async fn apply_config(state: &AppState, new_config: RedirectorConfig) {
    let current = state.config.load_full();

    let pending = restart_required(&current, &new_config);
    if !pending.is_empty() {
        tracing::warn!(sections = ?pending, "Some changes take effect after a restart");
    }

    let store_changed = current.store != new_config.store;
    if store_changed {
        if let Err(e) = state.rules.reconfigure(&new_config.store) {
            tracing::error!(error = %e, "Rejected store settings, keeping current config");
            return;
        }
    }

    state.config.store(Arc::new(new_config));
    tracing::info!(store_changed, "Configuration reloaded");

    if store_changed {
        state.rules.refresh().await;
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.rules.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "rules": snapshot.rules.len(),
    }))
}

/// Forward a pass-through request to the upstream, or answer 404.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request.request_id().to_string();
    let upstream = state.config.load().upstream.address.clone();

    let Some(upstream) = upstream else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = match Authority::from_str(&upstream) {
        Ok(authority) => Some(authority),
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Invalid upstream address");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream").into_response();
        }
    };
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    tracing::debug!(request_id = %request_id, uri = %parts.uri, "Forwarding to upstream");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
