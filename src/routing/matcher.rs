//! Path pattern matching.
//!
//! # Responsibilities
//! - Split a pattern into literal and placeholder segments
//! - Match a concrete request path against a pattern
//! - Collect placeholder bindings into a `ParameterMap`
//!
//! # Design Decisions
//! - Both path and pattern are split on `/` with the same rule, so leading,
//!   trailing and doubled slashes produce empty segments on both sides
//! - Segment counts must be equal; no optional, wildcard or trailing capture
//! - Placeholders bind any value, including the empty string
//! - A bare `:` segment binds under the empty name; duplicate names overwrite
//!   (last wins) but keep the position of the first binding
//! - Matching is case-sensitive and never allocates for literal segments

/// Marker that turns a pattern segment into a placeholder.
pub const PARAM_MARKER: char = ':';

/// One `/`-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Binds the path segment under this name (marker stripped).
    Placeholder(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(PARAM_MARKER) {
            Some(name) => Segment::Placeholder(name.to_string()),
            None => Segment::Literal(raw.to_string()),
        }
    }
}

/// A source pattern split into typed segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern string. Parsing never fails.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw.split('/').map(Segment::parse).collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match `path` against this pattern.
    ///
    /// Returns `None` as soon as the segment counts differ or a literal
    /// segment mismatches.
    pub fn matches(&self, path: &str) -> Option<MatchResult> {
        // Counting first keeps the mismatch path free of any comparison.
        if path.split('/').count() != self.segments.len() {
            return None;
        }

        let mut params = ParameterMap::new();
        for (segment, value) in self.segments.iter().zip(path.split('/')) {
            match segment {
                Segment::Placeholder(name) => params.insert(name.clone(), value.to_string()),
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
            }
        }

        Some(MatchResult { params })
    }
}

/// Match `path` against the pattern string `pattern`.
pub fn match_path(path: &str, pattern: &str) -> Option<MatchResult> {
    Pattern::parse(pattern).matches(path)
}

/// Placeholder bindings, kept in the order the placeholders appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: Vec<(String, String)>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`. Rebinding an existing name replaces its value
    /// in place.
    pub fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (k, v) in iter {
            map.insert(k.into(), v.into());
        }
        map
    }
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub params: ParameterMap,
}
