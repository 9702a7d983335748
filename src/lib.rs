//! Rule-based path redirection library.
//!
//! The core lives in [`routing`]: pure functions that match a request path
//! against ordered `source` patterns and expand the `destination` of the first
//! match. Everything else is the service around it.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::RedirectorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{resolve, RedirectDecision, RedirectRule, Resolution};
