//! Rule file loading
//!
//! The rule file is a YAML document with a single `rules` list; each entry
//! deserializes into a [`RuleConfig`]. Loading compiles the whole set, so an
//! invalid pattern or header entry anywhere refuses startup.
//!
//! ```yaml
//! rules:
//!   - endpoint: "/api"
//!     forbidden_user_agents: ["curl/.*"]
//!     forbidden_headers: ["X-Forbidden: attack.*"]
//!     required_headers: ["Authorization"]
//!     max_request_length_bytes: 1024
//!     forbidden_response_codes: [500]
//!     forbidden_request_re: ["DROP TABLE"]
//!     forbidden_response_re: ["BEGIN RSA PRIVATE KEY"]
//! ```

use crate::policy::rule::{RuleConfig, RuleSet, RuleSetError};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

/// Load and compile the rule file at `path`
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet, RuleSetError> {
    let path = path.as_ref();
    let file = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml).required(true))
        .build()
        .and_then(|config| config.try_deserialize::<RuleFile>())
        .map_err(|source| RuleSetError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let rules = RuleSet::compile(file.rules)?;
    info!(path = %path.display(), rules = rules.len(), "Rule set loaded");
    Ok(rules)
}

/// Compile a rule set from an in-memory YAML document
pub fn rules_from_yaml(yaml: &str) -> Result<RuleSet, RuleSetError> {
    let file: RuleFile = Config::builder()
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()?
        .try_deserialize()?;
    RuleSet::compile(file.rules)
}
