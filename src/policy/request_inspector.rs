//! Request-side predicates of a rule
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. user agent against `forbidden_user_agents`
//! 2. forbidden headers
//! 3. required headers
//! 4. declared `Content-Length` against `max_request_length_bytes`
//! 5. body against `forbidden_request_re`
//!
//! Checks 1-4 only need the request head and are grouped in
//! [`RequestInspector::inspect_head`], so an oversized request is refused
//! before a single body byte is read. Check 5 runs on the captured body.

use crate::policy::outcome::{InspectionOutcome, Violation};
use crate::policy::rule::Rule;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::HeaderMap;

/// Length announced by the `Content-Length` header, if any
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// First value of `name`, treating an empty value as absent
fn non_empty<'h>(headers: &'h HeaderMap, name: impl http::header::AsHeaderName) -> Option<&'h [u8]> {
    headers
        .get(name)
        .map(|value| value.as_bytes())
        .filter(|value| !value.is_empty())
}

pub struct RequestInspector<'a> {
    rule: &'a Rule,
}

impl<'a> RequestInspector<'a> {
    pub fn new(rule: &'a Rule) -> Self {
        Self { rule }
    }

    /// Run every check that does not need the body
    pub fn inspect_head(&self, headers: &HeaderMap) -> InspectionOutcome {
        self.check_user_agent(headers)
            .and_then(|| self.check_forbidden_headers(headers))
            .and_then(|| self.check_required_headers(headers))
            .and_then(|| self.check_declared_length(headers))
    }

    /// Run the body patterns against a fully captured body
    pub fn inspect_body(&self, body: &[u8]) -> InspectionOutcome {
        self.rule
            .forbidden_request_body()
            .first_match(body)
            .map(|pattern| Violation::ForbiddenRequestBody {
                pattern: pattern.as_str().to_string(),
            })
            .into()
    }

    fn check_user_agent(&self, headers: &HeaderMap) -> InspectionOutcome {
        // An absent user agent is tested as the empty string.
        let user_agent = headers
            .get(USER_AGENT)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        self.rule
            .forbidden_user_agents()
            .first_match(user_agent)
            .map(|pattern| Violation::ForbiddenUserAgent {
                pattern: pattern.as_str().to_string(),
            })
            .into()
    }

    fn check_forbidden_headers(&self, headers: &HeaderMap) -> InspectionOutcome {
        self.rule
            .forbidden_headers()
            .iter()
            .find(|forbidden| {
                non_empty(headers, &forbidden.name)
                    .is_some_and(|value| forbidden.pattern.matches(value))
            })
            .map(|forbidden| Violation::ForbiddenHeader {
                name: forbidden.name.to_string(),
                pattern: forbidden.pattern.as_str().to_string(),
            })
            .into()
    }

    fn check_required_headers(&self, headers: &HeaderMap) -> InspectionOutcome {
        self.rule
            .required_headers()
            .iter()
            .find(|name| non_empty(headers, *name).is_none())
            .map(|name| Violation::MissingRequiredHeader {
                name: name.to_string(),
            })
            .into()
    }

    fn check_declared_length(&self, headers: &HeaderMap) -> InspectionOutcome {
        let limit = self.rule.max_request_length();
        match declared_length(headers) {
            Some(length) if limit.is_exceeded_by(length) => {
                InspectionOutcome::Reject(Violation::RequestTooLarge {
                    declared: Some(length),
                    limit: *limit.as_ref(),
                })
            }
            _ => InspectionOutcome::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::rule::RuleConfig;
    use http::{HeaderName, HeaderValue};
    use rstest::rstest;

    fn compile(config: RuleConfig) -> Rule {
        Rule::compile(0, config).expect("test rule should compile")
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn strict_rule() -> Rule {
        compile(RuleConfig {
            endpoint: "/api".to_string(),
            forbidden_user_agents: vec!["curl/.*".to_string()],
            forbidden_headers: vec!["X-Forbidden: attack.*".to_string()],
            required_headers: vec!["Authorization".to_string()],
            max_request_length_bytes: 100,
            forbidden_request_re: vec!["DROP TABLE".to_string()],
            ..Default::default()
        })
    }

    #[test]
    fn test_clean_request_is_allowed() {
        let rule = strict_rule();
        let inspector = RequestInspector::new(&rule);
        let request = headers(&[
            ("user-agent", "Mozilla/5.0"),
            ("authorization", "Bearer token"),
            ("content-length", "100"),
        ]);

        assert_eq!(inspector.inspect_head(&request), InspectionOutcome::Allow);
        assert_eq!(
            inspector.inspect_body(b"SELECT 1"),
            InspectionOutcome::Allow
        );
    }

    #[test]
    fn test_forbidden_user_agent() {
        let rule = strict_rule();
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(&[
            ("user-agent", "curl/8.4.0"),
            ("authorization", "Bearer token"),
        ]));

        assert_eq!(
            outcome,
            InspectionOutcome::Reject(Violation::ForbiddenUserAgent {
                pattern: "curl/.*".to_string()
            })
        );
    }

    #[test]
    fn test_absent_user_agent_is_tested_as_empty() {
        let rule = compile(RuleConfig {
            endpoint: "/".to_string(),
            forbidden_user_agents: vec!["^$".to_string()],
            ..Default::default()
        });
        let inspector = RequestInspector::new(&rule);

        assert!(!inspector.inspect_head(&HeaderMap::new()).is_allowed());
        assert!(inspector
            .inspect_head(&headers(&[("user-agent", "bot")]))
            .is_allowed());
    }

    #[rstest]
    #[case("attack123", false)]
    #[case("no-attack-here", false)]
    #[case("benign", true)]
    fn test_forbidden_header_value(#[case] value: &str, #[case] allowed: bool) {
        let rule = strict_rule();
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(&[
            ("x-forbidden", value),
            ("authorization", "Bearer token"),
        ]));
        assert_eq!(outcome.is_allowed(), allowed);
    }

    #[test]
    fn test_empty_forbidden_header_is_ignored() {
        let rule = compile(RuleConfig {
            endpoint: "/".to_string(),
            forbidden_headers: vec!["X-Debug: .*".to_string()],
            ..Default::default()
        });
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(&[("x-debug", "")]));
        assert!(outcome.is_allowed());
    }

    #[rstest]
    #[case(&[], false)]
    #[case(&[("authorization", "")], false)]
    #[case(&[("authorization", "Bearer token")], true)]
    fn test_required_header(#[case] pairs: &[(&str, &str)], #[case] allowed: bool) {
        let rule = strict_rule();
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(pairs));
        assert_eq!(outcome.is_allowed(), allowed);
    }

    #[test]
    fn test_declared_length_over_limit() {
        let rule = strict_rule();
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(&[
            ("authorization", "Bearer token"),
            ("content-length", "101"),
        ]));

        assert_eq!(
            outcome,
            InspectionOutcome::Reject(Violation::RequestTooLarge {
                declared: Some(101),
                limit: 100
            })
        );
    }

    #[test]
    fn test_declared_length_ignored_without_limit() {
        let rule = compile(RuleConfig {
            endpoint: "/".to_string(),
            ..Default::default()
        });
        let outcome = RequestInspector::new(&rule)
            .inspect_head(&headers(&[("content-length", "1000000000")]));
        assert!(outcome.is_allowed());
    }

    #[test]
    fn test_first_failing_check_wins() {
        let rule = strict_rule();
        // Violates user agent, forbidden header, required header and length at once.
        let outcome = RequestInspector::new(&rule).inspect_head(&headers(&[
            ("user-agent", "curl/8.4.0"),
            ("x-forbidden", "attack"),
            ("content-length", "5000"),
        ]));

        assert!(matches!(
            outcome,
            InspectionOutcome::Reject(Violation::ForbiddenUserAgent { .. })
        ));
    }

    #[test]
    fn test_forbidden_body_pattern() {
        let rule = strict_rule();
        let outcome = RequestInspector::new(&rule).inspect_body(b"name'; DROP TABLE users; --");
        assert_eq!(
            outcome,
            InspectionOutcome::Reject(Violation::ForbiddenRequestBody {
                pattern: "DROP TABLE".to_string()
            })
        );
    }

    #[test]
    fn test_declared_length_parsing() {
        assert_eq!(declared_length(&headers(&[("content-length", "42")])), Some(42));
        assert_eq!(declared_length(&headers(&[("content-length", "nope")])), None);
        assert_eq!(declared_length(&HeaderMap::new()), None);
    }
}
