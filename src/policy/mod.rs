//! Declarative request/response policy
//!
//! A [`RuleSet`] is compiled once from the rule file and then consulted for
//! every request: the first rule whose endpoint prefixes the request path is
//! the only one applied. Its request-side predicates are evaluated by the
//! [`RequestInspector`], its response-side predicates by the
//! [`ResponseInspector`].

pub mod loader;
pub mod matcher;
pub mod outcome;
pub mod request_inspector;
pub mod response_inspector;
pub mod rule;

pub use loader::{load_rules, rules_from_yaml};
pub use matcher::{Pattern, PatternError, PatternSet};
pub use outcome::{InspectionOutcome, Violation};
pub use request_inspector::RequestInspector;
pub use response_inspector::ResponseInspector;
pub use rule::{ByteLimit, Rule, RuleConfig, RuleSet, RuleSetError};
