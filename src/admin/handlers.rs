use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::routing::Resolution;
use crate::store::{FetchStatus, RuleSnapshot};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub rules_loaded: usize,
    pub store: &'static str,
    pub fetch_status: FetchStatus,
    pub refreshed_at: Option<u64>,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ResolveReport {
    pub path: String,
    /// False when the path is excluded or interception is disabled.
    pub intercepted: bool,
    /// `redirect` or `pass_through`.
    pub outcome: &'static str,
    pub destination: Option<String>,
    pub status: Option<u16>,
    pub rule_index: Option<usize>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshot = state.rules.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        rules_loaded: snapshot.rules.len(),
        store: snapshot.store,
        fetch_status: snapshot.status.clone(),
        refreshed_at: snapshot.refreshed_at,
    })
}

pub async fn get_rules(State(state): State<AppState>) -> Json<RuleSnapshot> {
    Json(state.rules.snapshot().as_ref().clone())
}

pub async fn post_refresh(State(state): State<AppState>) -> Json<RuleSnapshot> {
    tracing::info!("Rule refresh requested via admin API");
    Json(state.rules.refresh().await.as_ref().clone())
}

/// Dry-run resolution against the live snapshot.
pub async fn get_resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolveReport> {
    let (intercepted, mode) = {
        let config = state.config.load();
        (
            config.interception.should_intercept(&query.path),
            config.interception.substitution,
        )
    };

    let resolution = if intercepted {
        state.rules.resolve(&query.path, mode)
    } else {
        Resolution::PassThrough
    };

    let report = match resolution {
        Resolution::Redirect(decision) => ResolveReport {
            path: query.path,
            intercepted,
            outcome: "redirect",
            destination: Some(decision.destination_path),
            status: Some(decision.status.as_u16()),
            rule_index: Some(decision.rule_index),
        },
        Resolution::PassThrough => ResolveReport {
            path: query.path,
            intercepted,
            outcome: "pass_through",
            destination: None,
            status: None,
            rule_index: None,
        },
    };
    Json(report)
}
