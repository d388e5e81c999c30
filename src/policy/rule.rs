//! Rule records and the ordered rule set
//!
//! A [`RuleConfig`] is the declarative form read from the rule file. It is
//! compiled into a [`Rule`] once, before the proxy serves anything; from then
//! on the [`RuleSet`] is shared read-only between all requests.

use crate::policy::matcher::{Pattern, PatternError, PatternSet};
use http::HeaderName;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Size ceiling in bytes, where zero means "no limit"
#[nutype(derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    From,
    AsRef,
    Deserialize,
    Serialize
))]
pub struct ByteLimit(u64);

impl ByteLimit {
    pub fn unlimited() -> Self {
        Self::from(0)
    }

    pub fn is_unlimited(&self) -> bool {
        *self.as_ref() == 0
    }

    /// Whether `len` bytes are over this limit
    pub fn is_exceeded_by(&self, len: u64) -> bool {
        !self.is_unlimited() && len > *self.as_ref()
    }

    /// The limit as an in-memory buffer size, `None` when unlimited
    pub fn as_buffer_limit(&self) -> Option<usize> {
        if self.is_unlimited() {
            None
        } else {
            Some(usize::try_from(*self.as_ref()).unwrap_or(usize::MAX))
        }
    }
}

/// Declarative rule as it appears in the rule file
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub endpoint: String,
    #[serde(default)]
    pub forbidden_user_agents: Vec<String>,
    /// Entries of the form `Header-Name: value-pattern`
    #[serde(default)]
    pub forbidden_headers: Vec<String>,
    #[serde(default)]
    pub required_headers: Vec<String>,
    #[serde(default)]
    pub max_request_length_bytes: u64,
    #[serde(default)]
    pub max_response_length_bytes: u64,
    #[serde(default)]
    pub forbidden_response_codes: Vec<u16>,
    #[serde(default)]
    pub forbidden_request_re: Vec<String>,
    #[serde(default)]
    pub forbidden_response_re: Vec<String>,
}

/// Errors raised while loading or compiling the rule set
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("failed to load rules from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("failed to parse rules: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("rule #{index} ({endpoint:?}): {source}")]
    InvalidPattern {
        index: usize,
        endpoint: String,
        #[source]
        source: PatternError,
    },

    #[error(
        "rule #{index} ({endpoint:?}): forbidden header entry {entry:?} is not of the form `Name: pattern`"
    )]
    MalformedHeaderEntry {
        index: usize,
        endpoint: String,
        entry: String,
    },

    #[error("rule #{index} ({endpoint:?}): invalid header name {name:?}")]
    InvalidHeaderName {
        index: usize,
        endpoint: String,
        name: String,
    },
}

/// A header that must not carry a value matching `pattern`
#[derive(Clone, Debug)]
pub struct ForbiddenHeader {
    pub name: HeaderName,
    pub pattern: Pattern,
}

/// Compiled, immutable rule
#[derive(Clone, Debug)]
pub struct Rule {
    endpoint: String,
    forbidden_user_agents: PatternSet,
    forbidden_headers: Vec<ForbiddenHeader>,
    required_headers: Vec<HeaderName>,
    max_request_length: ByteLimit,
    max_response_length: ByteLimit,
    forbidden_response_codes: BTreeSet<u16>,
    forbidden_request_body: PatternSet,
    forbidden_response_body: PatternSet,
}

impl Rule {
    /// Compile the rule at position `index` of the rule file
    pub fn compile(index: usize, config: RuleConfig) -> Result<Self, RuleSetError> {
        let endpoint = config.endpoint;
        let invalid_pattern = |source| RuleSetError::InvalidPattern {
            index,
            endpoint: endpoint.clone(),
            source,
        };
        let header_name = |name: &str| {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| RuleSetError::InvalidHeaderName {
                index,
                endpoint: endpoint.clone(),
                name: name.to_string(),
            })
        };

        let forbidden_headers = config
            .forbidden_headers
            .iter()
            .map(|entry| {
                let (name, pattern) =
                    entry
                        .split_once(':')
                        .ok_or_else(|| RuleSetError::MalformedHeaderEntry {
                            index,
                            endpoint: endpoint.clone(),
                            entry: entry.clone(),
                        })?;
                Ok(ForbiddenHeader {
                    name: header_name(name.trim())?,
                    pattern: Pattern::compile(pattern.trim()).map_err(invalid_pattern)?,
                })
            })
            .collect::<Result<Vec<_>, RuleSetError>>()?;

        let required_headers = config
            .required_headers
            .iter()
            .map(|name| header_name(name.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let forbidden_user_agents =
            PatternSet::compile(&config.forbidden_user_agents).map_err(invalid_pattern)?;
        let forbidden_request_body =
            PatternSet::compile(&config.forbidden_request_re).map_err(invalid_pattern)?;
        let forbidden_response_body =
            PatternSet::compile(&config.forbidden_response_re).map_err(invalid_pattern)?;

        Ok(Self {
            forbidden_user_agents,
            forbidden_headers,
            required_headers,
            max_request_length: ByteLimit::from(config.max_request_length_bytes),
            max_response_length: ByteLimit::from(config.max_response_length_bytes),
            forbidden_response_codes: config.forbidden_response_codes.into_iter().collect(),
            forbidden_request_body,
            forbidden_response_body,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether this rule governs a request for `path`
    pub fn applies_to(&self, path: &str) -> bool {
        path.starts_with(&self.endpoint)
    }

    pub fn forbidden_user_agents(&self) -> &PatternSet {
        &self.forbidden_user_agents
    }

    pub fn forbidden_headers(&self) -> &[ForbiddenHeader] {
        &self.forbidden_headers
    }

    pub fn required_headers(&self) -> &[HeaderName] {
        &self.required_headers
    }

    pub fn max_request_length(&self) -> ByteLimit {
        self.max_request_length
    }

    pub fn max_response_length(&self) -> ByteLimit {
        self.max_response_length
    }

    pub fn forbids_status(&self, status: u16) -> bool {
        self.forbidden_response_codes.contains(&status)
    }

    pub fn forbidden_request_body(&self) -> &PatternSet {
        &self.forbidden_request_body
    }

    pub fn forbidden_response_body(&self) -> &PatternSet {
        &self.forbidden_response_body
    }

    /// Request bodies are buffered only for rules that inspect them
    pub fn inspects_request_body(&self) -> bool {
        !self.forbidden_request_body.is_empty()
    }
}

/// Ordered, immutable collection of compiled rules
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile every rule; any invalid rule rejects the whole set
    pub fn compile(configs: impl IntoIterator<Item = RuleConfig>) -> Result<Self, RuleSetError> {
        let rules = configs
            .into_iter()
            .enumerate()
            .map(|(index, config)| Rule::compile(index, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The first rule, in declaration order, whose endpoint prefixes `path`
    pub fn select(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.applies_to(path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}
