//! Precompiled regular-expression predicates
//!
//! Every pattern a rule carries is compiled exactly once while the rule set is
//! built. Matching is unanchored: a pattern matches if it matches anywhere in
//! the candidate. Candidates are raw bytes so that header values which are not
//! valid UTF-8 and arbitrary bodies go through the same engine.

use regex::bytes::Regex;
use std::fmt;
use thiserror::Error;

/// A pattern failed to compile
#[derive(Error, Debug)]
#[error("invalid pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A single compiled pattern
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern, keeping its source text for diagnostics
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Whether the pattern matches anywhere in `candidate`
    pub fn matches(&self, candidate: impl AsRef<[u8]>) -> bool {
        self.regex.is_match(candidate.as_ref())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

/// Ordered list of patterns, evaluated in declaration order
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// First pattern (in declaration order) that matches `candidate`
    pub fn first_match(&self, candidate: impl AsRef<[u8]>) -> Option<&Pattern> {
        let candidate = candidate.as_ref();
        self.patterns.iter().find(|p| p.matches(candidate))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

}
