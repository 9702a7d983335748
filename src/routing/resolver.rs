//! Redirect rule evaluation.
//!
//! # Responsibilities
//! - Walk an ordered rule list against a request path
//! - Expand the destination of the first matching rule
//! - Return a redirect decision or an explicit pass-through
//!
//! # Design Decisions
//! - First match wins; list order is the only precedence
//! - Missing or empty rule lists pass through without matching anything
//! - Pure: no I/O, no shared state, safe to call from any task

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::routing::matcher::Pattern;
use crate::routing::template::{expand_with, SubstitutionMode};

/// A single redirect rule as stored in the rule store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RedirectRule {
    /// Source pattern, e.g. `/old/:id`.
    pub source: String,

    /// Destination template, e.g. `/new/:id`.
    pub destination: String,

    /// `true` answers 308, `false` answers 307.
    #[serde(default)]
    pub permanent: bool,
}

impl RedirectRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, permanent: bool) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            permanent,
        }
    }

    /// Status code the redirect is answered with.
    pub fn status_code(&self) -> StatusCode {
        if self.permanent {
            StatusCode::PERMANENT_REDIRECT
        } else {
            StatusCode::TEMPORARY_REDIRECT
        }
    }
}

/// Where to send the client and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    /// Expanded destination path.
    pub destination_path: String,

    /// 307 or 308.
    pub status: StatusCode,

    /// Position of the matching rule in the list.
    pub rule_index: usize,
}

/// Result of resolving one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(RedirectDecision),
    PassThrough,
}

impl Resolution {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Resolution::PassThrough)
    }

    pub fn decision(&self) -> Option<&RedirectDecision> {
        match self {
            Resolution::Redirect(decision) => Some(decision),
            Resolution::PassThrough => None,
        }
    }
}

/// Resolve `path` against `rules` with first-occurrence substitution.
pub fn resolve(path: &str, rules: Option<&[RedirectRule]>) -> Resolution {
    resolve_with(path, rules, SubstitutionMode::First)
}

/// Resolve `path` against `rules` using the given substitution mode.
pub fn resolve_with(
    path: &str,
    rules: Option<&[RedirectRule]>,
    mode: SubstitutionMode,
) -> Resolution {
    let rules = match rules {
        Some(rules) if !rules.is_empty() => rules,
        _ => return Resolution::PassThrough,
    };

    for (index, rule) in rules.iter().enumerate() {
        if let Some(matched) = Pattern::parse(&rule.source).matches(path) {
            return Resolution::Redirect(RedirectDecision {
                destination_path: expand_with(&rule.destination, &matched.params, mode),
                status: rule.status_code(),
                rule_index: index,
            });
        }
    }

    Resolution::PassThrough
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(path: &str, rules: &[RedirectRule]) -> RedirectDecision {
        match resolve(path, Some(rules)) {
            Resolution::Redirect(decision) => decision,
            Resolution::PassThrough => panic!("expected a redirect for {}", path),
        }
    }

    #[test]
    fn test_permanent_redirect() {
        let rules = vec![RedirectRule::new("/old/:id", "/new/:id", true)];
        let decision = redirect("/old/42", &rules);
        assert_eq!(decision.destination_path, "/new/42");
        assert_eq!(decision.status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(decision.status.as_u16(), 308);
    }

    #[test]
    fn test_temporary_redirect_with_reordered_params() {
        let rules = vec![RedirectRule::new("/a/:x/:y", "/b/:y/:x", false)];
        let decision = redirect("/a/1/2", &rules);
        assert_eq!(decision.destination_path, "/b/2/1");
        assert_eq!(decision.status.as_u16(), 307);
    }

    #[test]
    fn test_segment_count_mismatch_passes_through() {
        let rules = vec![RedirectRule::new("/fixed", "/dest", false)];
        assert!(resolve("/fixed/extra", Some(&rules)).is_pass_through());
    }

    #[test]
    fn test_absent_or_empty_rules_pass_through() {
        assert_eq!(resolve("/anything", None), Resolution::PassThrough);
        assert_eq!(resolve("/anything", Some(&[])), Resolution::PassThrough);
    }

    #[test]
    fn test_repeated_destination_token() {
        let rules = vec![RedirectRule::new("/dup/:id", "/x/:id/:id", false)];
        assert_eq!(redirect("/dup/9", &rules).destination_path, "/x/9/:id");

        let all = resolve_with("/dup/9", Some(&rules), SubstitutionMode::All);
        assert_eq!(all.decision().unwrap().destination_path, "/x/9/9");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            RedirectRule::new("/docs/intro", "/guide/start", false),
            RedirectRule::new("/docs/:page", "/guide/:page", true),
            RedirectRule::new("/docs/:other", "/never", true),
        ];

        let decision = redirect("/docs/intro", &rules);
        assert_eq!(decision.destination_path, "/guide/start");
        assert_eq!(decision.rule_index, 0);

        let decision = redirect("/docs/setup", &rules);
        assert_eq!(decision.destination_path, "/guide/setup");
        assert_eq!(decision.status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(decision.rule_index, 1);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let rules = vec![RedirectRule::new("/old/:id", "/new/:id", true)];
        assert_eq!(resolve("/old/1", Some(&rules)), resolve("/old/1", Some(&rules)));
    }

    #[test]
    fn test_rule_deserialization_defaults() {
        let rule: RedirectRule =
            serde_json::from_str(r#"{"source": "/a", "destination": "/b"}"#).unwrap();
        assert!(!rule.permanent);
        assert_eq!(rule.status_code(), StatusCode::TEMPORARY_REDIRECT);
    }
}
