//! Redirect interception middleware.
//! Answers matching requests with a redirect; everything else continues.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::http::request::RequestIdExt;
use crate::http::response::redirect_response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::Resolution;

pub async fn redirect_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path();

    // Read what we need up front; the config guard must not live across an await.
    let (intercept, mode) = {
        let config = state.config.load();
        (
            config.interception.should_intercept(path),
            config.interception.substitution,
        )
    };

    if !intercept {
        metrics::record_request("excluded", start);
        return next.run(request).await;
    }

    match state.rules.resolve(path, mode) {
        Resolution::Redirect(decision) => {
            tracing::info!(
                request_id = %request.request_id(),
                path = %path,
                destination = %decision.destination_path,
                status = decision.status.as_u16(),
                rule = decision.rule_index,
                "Redirecting request"
            );
            let outcome = if decision.status.as_u16() == 308 {
                "redirect_308"
            } else {
                "redirect_307"
            };
            metrics::record_request(outcome, start);
            redirect_response(request.uri(), request.headers(), &decision)
        }
        Resolution::PassThrough => {
            tracing::debug!(request_id = %request.request_id(), path = %path, "No redirect rule matched");
            metrics::record_request("pass_through", start);
            next.run(request).await
        }
    }
}
