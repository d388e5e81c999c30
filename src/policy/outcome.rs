//! Inspection results

use std::fmt;

/// The concrete predicate a request or response failed
///
/// Only ever logged; clients see an opaque denial regardless of the variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    ForbiddenUserAgent { pattern: String },
    ForbiddenHeader { name: String, pattern: String },
    MissingRequiredHeader { name: String },
    /// `declared` is the announced length; `None` when the cap was hit while reading
    RequestTooLarge { declared: Option<u64>, limit: u64 },
    ForbiddenRequestBody { pattern: String },
    ForbiddenResponseCode { status: u16 },
    ResponseTooLarge { declared: Option<u64>, limit: u64 },
    ForbiddenResponseBody { pattern: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForbiddenUserAgent { pattern } => {
                write!(f, "user agent matches forbidden pattern {pattern:?}")
            }
            Self::ForbiddenHeader { name, pattern } => {
                write!(f, "header {name} matches forbidden pattern {pattern:?}")
            }
            Self::MissingRequiredHeader { name } => write!(f, "required header {name} is missing"),
            Self::RequestTooLarge { declared, limit } => {
                write_too_large(f, "request", *declared, *limit)
            }
            Self::ForbiddenRequestBody { pattern } => {
                write!(f, "request body matches forbidden pattern {pattern:?}")
            }
            Self::ForbiddenResponseCode { status } => {
                write!(f, "upstream returned forbidden status {status}")
            }
            Self::ResponseTooLarge { declared, limit } => {
                write_too_large(f, "response", *declared, *limit)
            }
            Self::ForbiddenResponseBody { pattern } => {
                write!(f, "response body matches forbidden pattern {pattern:?}")
            }
        }
    }
}

fn write_too_large(
    f: &mut fmt::Formatter<'_>,
    side: &str,
    declared: Option<u64>,
    limit: u64,
) -> fmt::Result {
    match declared {
        Some(length) => write!(f, "{side} body of {length} bytes exceeds limit of {limit}"),
        None => write!(f, "{side} body exceeds limit of {limit} bytes"),
    }
}

/// Result of running one side of a rule against a request or response
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InspectionOutcome {
    Allow,
    Reject(Violation),
}

impl InspectionOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Continue with the next check only if this one allowed
    pub fn and_then(self, next: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Allow => next(),
            rejected => rejected,
        }
    }

    pub fn into_result(self) -> Result<(), Violation> {
        match self {
            Self::Allow => Ok(()),
            Self::Reject(violation) => Err(violation),
        }
    }
}

impl From<Option<Violation>> for InspectionOutcome {
    fn from(violation: Option<Violation>) -> Self {
        violation.map_or(Self::Allow, Self::Reject)
    }
}
