//! Proxy module for enforcing the rule set inline
//!
//! This module implements the request/response inspection pipeline:
//! - Forwarder: relays requests to the single protected upstream
//! - Pipeline: selects a rule and runs the inspectors around the forward step
//! - Service: exposes the pipeline as an Axum router

pub mod body;
pub mod error_response;
pub mod forwarder;
pub mod headers;
pub mod middleware;
pub mod pipeline;
pub mod service;
pub mod types;
pub mod url_resolver;

#[cfg(test)]
mod test_utils;



pub use service::FirewallService;
pub use types::{ProxyConfig, ProxyError, ProxyResult, TargetUrl};
