//! Redirect response construction.
//!
//! # Responsibilities
//! - Build the `Location` for a redirect decision
//! - Turn a decision into a 307/308 response
//!
//! # Design Decisions
//! - Only the path of the original URL changes; query string is preserved
//! - Absolute `Location` when the request carries a host (the URI authority,
//!   else the `Host` header), relative otherwise
//! - `x-forwarded-proto` selects the scheme behind a TLS terminator
//! - Path characters that are not valid in a URL path are percent-encoded

use axum::http::{header, HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use url::{Position, Url};

use crate::routing::RedirectDecision;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// `Location` value for redirecting `uri` to `destination_path`.
pub fn location_for(uri: &Uri, headers: &HeaderMap, destination_path: &str) -> String {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let host = uri.authority().map(|a| a.as_str().to_string()).or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    });

    let scheme = uri
        .scheme_str()
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(X_FORWARDED_PROTO)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.split(',').next())
                .map(|s| s.trim().to_ascii_lowercase())
        })
        .filter(|s| s == "http" || s == "https")
        .unwrap_or_else(|| "http".to_string());

    if let Some(host) = host {
        if let Ok(mut url) = Url::parse(&format!("{}://{}{}", scheme, host, path_and_query)) {
            url.set_path(destination_path);
            return url.to_string();
        }
    }

    // No usable host: resolve against a placeholder origin and keep the path onward.
    match Url::parse(&format!("http://localhost{}", path_and_query)) {
        Ok(mut url) => {
            url.set_path(destination_path);
            url[Position::BeforePath..].to_string()
        }
        Err(_) => destination_path.to_string(),
    }
}

/// Redirect response for `decision`.
pub fn redirect_response(uri: &Uri, headers: &HeaderMap, decision: &RedirectDecision) -> Response {
    let location = location_for(uri, headers, &decision.destination_path);
    (decision.status, [(header::LOCATION, location)]).into_response()
}
