//! Route templates and positional path matching.
//!
//! A template is a `/`-delimited string such as `/users/:userId/invite`. Each
//! segment is either a literal, compared by string equality, or a named
//! variable introduced by `:`, which binds the request segment at the same
//! position. Matching is a single pass over the segments with no
//! backtracking.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::RouteError;

/// Sigil that introduces a named variable segment.
pub const VARIABLE_SIGIL: char = ':';

/// Maximum number of bindings before heap allocation.
/// Route templates rarely carry more than a handful of variables.
pub const MAX_INLINE_BINDINGS: usize = 8;

/// Inline storage for bindings.
///
/// Variable names are `Arc<str>` shared with the parsed pattern, so binding
/// a value clones a pointer rather than the name.
pub type BindingVec = SmallVec<[(Arc<str>, String); MAX_INLINE_BINDINGS]>;

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid variable name regex"));

/// Variable name → raw value extracted from one successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BindingVec);

impl Bindings {
    /// Value bound to `name`, if any
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in template order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a HashMap
    /// Note: This allocates - use get() when only a few values are needed
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn push(&mut self, name: Arc<str>, value: &str) {
        self.0.push((name, value.to_string()));
    }
}

impl IntoIterator for Bindings {
    type Item = (Arc<str>, String);
    type IntoIter = smallvec::IntoIter<[(Arc<str>, String); MAX_INLINE_BINDINGS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One `/`-delimited component of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly
    Literal(String),
    /// Binds the request segment under this name
    Variable(Arc<str>),
}

/// A parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    variable_count: usize,
}

impl PathPattern {
    /// Parse a route template.
    ///
    /// The template must start with `/`. A segment beginning with `:` is a
    /// variable; trailing `:` characters are not part of its name, so
    /// `:action:` names `action`. Variable names must be identifiers and
    /// unique within the template.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] when any of the above does not hold.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        if !template.starts_with('/') {
            return Err(RouteError::invalid_pattern(template, "must start with '/'"));
        }

        let mut segments = Vec::with_capacity(template.matches('/').count() + 1);
        let mut names: Vec<Arc<str>> = Vec::new();

        for raw in template.split('/') {
            let Some(rest) = raw.strip_prefix(VARIABLE_SIGIL) else {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            };

            let name = rest.trim_end_matches(VARIABLE_SIGIL);
            if !VARIABLE_NAME.is_match(name) {
                return Err(RouteError::invalid_pattern(
                    template,
                    format!("'{raw}' does not name a variable"),
                ));
            }
            if names.iter().any(|n| n.as_ref() == name) {
                return Err(RouteError::invalid_pattern(
                    template,
                    format!("variable '{name}' appears more than once"),
                ));
            }

            let name: Arc<str> = Arc::from(name);
            names.push(Arc::clone(&name));
            segments.push(Segment::Variable(name));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
            variable_count: names.len(),
        })
    }

    /// The template as registered
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in template order
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(name) => Some(name.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template has no variable segments
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.variable_count == 0
    }

    /// Match a request path against this pattern.
    ///
    /// Returns the bindings on success, empty for a static pattern. The path
    /// must have exactly as many segments as the pattern; values are bound
    /// verbatim, without decoding or type checks.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Bindings> {
        if self.is_static() {
            return (path == self.template).then(Bindings::default);
        }

        let mut bindings = Bindings::default();
        let mut request = path.split('/');

        for segment in &self.segments {
            // Pattern longer than the request
            let actual = request.next()?;
            match segment {
                Segment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                Segment::Variable(name) => bindings.push(Arc::clone(name), actual),
            }
        }

        // Request longer than the pattern
        if request.next().is_some() {
            return None;
        }

        Some(bindings)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Match `path` against `pattern`.
///
/// Equivalent to [`PathPattern::matches`].
#[inline]
#[must_use]
pub fn match_path(pattern: &PathPattern, path: &str) -> Option<Bindings> {
    pattern.matches(path)
}
