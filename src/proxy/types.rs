//! Type definitions for the proxy module

use crate::policy::Violation;
use nutype::nutype;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ========== Address Types ==========

/// Base address of the protected upstream service
///
/// Request paths are appended to it verbatim, so it carries a scheme and an
/// authority and usually no trailing slash.
#[nutype(
    sanitize(trim),
    validate(predicate = |s: &str| s.len() > "http://".len() && s.starts_with("http://")),
    derive(Clone, Debug, Display, Deserialize, Serialize, TryFrom, AsRef),
)]
pub struct TargetUrl(String);

// ========== Constants ==========

/// Body of the response sent for any policy rejection
pub const FORBIDDEN_BODY: &str = "Forbidden";

/// Body of the response sent when the inbound body cannot be read
pub const BAD_REQUEST_BODY: &str = "Bad Request";

/// Body of the response sent when the upstream cannot be reached
pub const BAD_GATEWAY_BODY: &str = "Bad Gateway";

/// Default upstream timeout
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy configuration
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Where every request is forwarded
    pub target_url: TargetUrl,
    /// Upper bound on waiting for the upstream response head
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    pub fn new(target_url: TargetUrl) -> Self {
        Self {
            target_url,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

/// Stages of the policy pipeline, used to label log events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    SelectRule,
    RequestCheck,
    Forward,
    ResponseCheck,
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectRule => "select_rule",
            Self::RequestCheck => "request_check",
            Self::Forward => "forward",
            Self::ResponseCheck => "response_check",
            Self::Deliver => "deliver",
        };
        f.write_str(name)
    }
}

/// Terminal failures of a single proxied exchange
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Policy violation: {0}")]
    PolicyViolation(Violation),

    #[error("Malformed inbound request: {0}")]
    MalformedInbound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl From<Violation> for ProxyError {
    fn from(violation: Violation) -> Self {
        Self::PolicyViolation(violation)
    }
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_validation() {
        assert!(TargetUrl::try_new("http://localhost:8081".to_string()).is_ok());
        assert!(TargetUrl::try_new("  http://10.0.0.1  ".to_string()).is_ok());
        assert!(TargetUrl::try_new("http://".to_string()).is_err());
        assert!(TargetUrl::try_new("localhost:8081".to_string()).is_err());
        assert!(TargetUrl::try_new("ftp://example.com".to_string()).is_err());
    }

    #[test]
    fn test_target_url_is_trimmed() {
        let url = TargetUrl::try_new(" http://backend:9000 ".to_string()).unwrap();
        assert_eq!(url.as_ref(), "http://backend:9000");
    }

    #[test]
    fn test_proxy_config_builder() {
        let url = TargetUrl::try_new("http://backend".to_string()).unwrap();
        let config = ProxyConfig::new(url).with_upstream_timeout(Duration::from_secs(2));
        assert_eq!(config.upstream_timeout, Duration::from_secs(2));
        assert_eq!(config.target_url.as_ref(), "http://backend");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::RequestCheck.to_string(), "request_check");
        assert_eq!(Stage::ResponseCheck.to_string(), "response_check");
    }
}
