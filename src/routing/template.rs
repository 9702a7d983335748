//! Destination template expansion.
//!
//! # Responsibilities
//! - Substitute `:name` tokens in a destination template with bound values
//!
//! # Design Decisions
//! - Parameters are applied in match order, one key at a time
//! - Default mode replaces only the first occurrence of each token; a
//!   repeated token is left as written (`/x/:id/:id` becomes `/x/9/:id`)
//! - Substituted values are never scanned again, so a value containing
//!   `:other` stays intact
//! - Tokens with no binding pass through unchanged

use serde::{Deserialize, Serialize};

use crate::routing::matcher::{ParameterMap, PARAM_MARKER};

/// How many occurrences of each token get replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionMode {
    /// First occurrence only.
    #[default]
    First,
    /// Every occurrence.
    All,
}

enum Piece<'a> {
    /// Template text still open for substitution.
    Text(String),
    /// A bound value; never rescanned.
    Value(&'a str),
}

/// Expand `template` with first-occurrence substitution.
pub fn expand(template: &str, params: &ParameterMap) -> String {
    expand_with(template, params, SubstitutionMode::First)
}

/// Expand `template` using the given substitution mode.
pub fn expand_with(template: &str, params: &ParameterMap, mode: SubstitutionMode) -> String {
    let mut pieces = vec![Piece::Text(template.to_string())];

    for (name, value) in params.iter() {
        let token = format!("{}{}", PARAM_MARKER, name);
        pieces = substitute(pieces, &token, value, mode);
    }

    let mut out = String::with_capacity(template.len());
    for piece in &pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Value(value) => out.push_str(value),
        }
    }
    out
}

fn substitute<'a>(
    pieces: Vec<Piece<'a>>,
    token: &str,
    value: &'a str,
    mode: SubstitutionMode,
) -> Vec<Piece<'a>> {
    let mut out = Vec::with_capacity(pieces.len() + 2);
    let mut replaced = false;

    for piece in pieces {
        let text = match piece {
            Piece::Text(text) if !(replaced && mode == SubstitutionMode::First) => text,
            other => {
                out.push(other);
                continue;
            }
        };

        let mut rest = text.as_str();
        while let Some(at) = rest.find(token) {
            out.push(Piece::Text(rest[..at].to_string()));
            out.push(Piece::Value(value));
            rest = &rest[at + token.len()..];
            replaced = true;
            if mode == SubstitutionMode::First {
                break;
            }
        }
        out.push(Piece::Text(rest.to_string()));
    }

    out
}
