//! Main firewall service implementation
//!
//! The `FirewallService` is the entry point of the proxy: it owns the policy
//! pipeline and exposes it as an Axum router that accepts any method on any
//! path.
//!
//! ## Service Lifecycle
//!
//! ```rust,ignore
//! use inline_firewall::policy::load_rules;
//! use inline_firewall::proxy::{FirewallService, ProxyConfig, TargetUrl};
//!
//! // 1. Compile the rule set once, refusing to start on any invalid rule
//! let rules = load_rules("rules.yaml")?;
//!
//! // 2. Create the service and convert it to a router
//! let target = TargetUrl::try_new("http://127.0.0.1:8081".to_string())?;
//! let router = FirewallService::new(ProxyConfig::new(target), rules).into_router();
//!
//! // 3. Serve with Axum
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use crate::policy::RuleSet;
use crate::proxy::forwarder::Forwarder;
use crate::proxy::middleware::logging_middleware;
use crate::proxy::pipeline::PolicyPipeline;
use crate::proxy::types::*;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::from_fn,
    response::Response,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::error;

/// Reverse proxy enforcing a rule set in front of one upstream
pub struct FirewallService {
    pipeline: PolicyPipeline,
}

impl FirewallService {
    pub fn new(config: ProxyConfig, rules: impl Into<Arc<RuleSet>>) -> Self {
        let forwarder = Forwarder::new(config);
        Self {
            pipeline: PolicyPipeline::new(rules.into(), forwarder),
        }
    }

    /// Create an Axum router that sends every request through the pipeline
    pub fn into_router(self) -> axum::Router {
        axum::Router::new()
            .fallback(firewall_handler)
            .with_state(Arc::new(self))
            .layer(ServiceBuilder::new().layer(from_fn(logging_middleware)))
    }
}

/// Axum handler for every inbound request
async fn firewall_handler(
    State(firewall): State<Arc<FirewallService>>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    firewall.pipeline.process(request).await.inspect_err(|e| {
        if !matches!(e, ProxyError::PolicyViolation(_)) {
            error!(error = %e, "Request failed");
        }
    })
}
