//! Redirect routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path + ordered RedirectRule[]
//!     → resolver.rs (walk rules in order)
//!     → matcher.rs (split, compare literals, bind placeholders)
//!     → template.rs (substitute bindings into destination)
//!     → Return: Redirect(decision) or PassThrough
//! ```
//!
//! # Design Decisions
//! - Pure functions over their inputs; rules arrive as a snapshot
//! - No regex in the hot path (segment comparison only)
//! - Deterministic: same input always yields the same decision
//! - First match wins (list order)

pub mod matcher;
pub mod resolver;
pub mod template;

pub use matcher::{match_path, MatchResult, ParameterMap, Pattern, Segment};
pub use resolver::{resolve, resolve_with, RedirectDecision, RedirectRule, Resolution};
pub use template::{expand, expand_with, SubstitutionMode};
