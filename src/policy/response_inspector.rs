//! Response-side predicates of a rule
//!
//! Order: status code denylist, size ceiling, body patterns. The status and
//! the declared length are checked from the response head, before the body is
//! read; the body patterns need the fully captured body.

use crate::policy::outcome::{InspectionOutcome, Violation};
use crate::policy::request_inspector::declared_length;
use crate::policy::rule::Rule;
use http::{HeaderMap, StatusCode};

pub struct ResponseInspector<'a> {
    rule: &'a Rule,
}

impl<'a> ResponseInspector<'a> {
    pub fn new(rule: &'a Rule) -> Self {
        Self { rule }
    }

    pub fn inspect_head(&self, status: StatusCode, headers: &HeaderMap) -> InspectionOutcome {
        self.check_status(status)
            .and_then(|| self.check_declared_length(headers))
    }

    pub fn inspect_body(&self, body: &[u8]) -> InspectionOutcome {
        self.rule
            .forbidden_response_body()
            .first_match(body)
            .map(|pattern| Violation::ForbiddenResponseBody {
                pattern: pattern.as_str().to_string(),
            })
            .into()
    }

    fn check_status(&self, status: StatusCode) -> InspectionOutcome {
        if self.rule.forbids_status(status.as_u16()) {
            InspectionOutcome::Reject(Violation::ForbiddenResponseCode {
                status: status.as_u16(),
            })
        } else {
            InspectionOutcome::Allow
        }
    }

    fn check_declared_length(&self, headers: &HeaderMap) -> InspectionOutcome {
        let limit = self.rule.max_response_length();
        match declared_length(headers) {
            Some(length) if limit.is_exceeded_by(length) => {
                InspectionOutcome::Reject(Violation::ResponseTooLarge {
                    declared: Some(length),
                    limit: *limit.as_ref(),
                })
            }
            _ => InspectionOutcome::Allow,
        }
    }
}
