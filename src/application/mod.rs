//! Application wiring
//!
//! Turns validated settings into a running firewall: loads the rule set,
//! builds the service and owns the listener lifecycle.

pub mod app;

pub use app::Application;
