//! Policy pipeline
//!
//! Every request walks `SelectRule -> RequestCheck -> Forward -> ResponseCheck
//! -> Deliver`. A rejection at either check ends the exchange with the fixed
//! forbidden response; a transport failure ends it with the fixed gateway
//! error. When no rule matches, the request skips both checks and is relayed
//! as a stream in both directions.
//!
//! Only the first rule (in declaration order) whose endpoint prefixes the path
//! is applied; rules never stack.
//!
//! Under a rule the upstream timeout bounds the whole upstream exchange, from
//! sending the request to the last byte of the captured response body.

use crate::policy::{RequestInspector, ResponseInspector, Rule, RuleSet, Violation};
use crate::proxy::body::{capture, CaptureError, CapturedBody};
use crate::proxy::forwarder::Forwarder;
use crate::proxy::types::*;
use axum::body::Body;
use hyper::{Request, Response};
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Applies the rule set around the forward step
#[derive(Clone)]
pub struct PolicyPipeline {
    rules: Arc<RuleSet>,
    forwarder: Forwarder,
}

impl PolicyPipeline {
    pub fn new(rules: Arc<RuleSet>, forwarder: Forwarder) -> Self {
        Self { rules, forwarder }
    }

    /// Run one request through the pipeline
    pub async fn process(&self, request: Request<Body>) -> ProxyResult<Response<Body>> {
        match self.rules.select(request.uri().path()) {
            Some(rule) => self.enforce(rule, request).await,
            None => {
                debug!(
                    stage = %Stage::SelectRule,
                    path = %request.uri().path(),
                    "No rule matched, passing through"
                );
                self.pass_through(request).await
            }
        }
    }

    /// Transparent proxying without buffering or inspection
    async fn pass_through(&self, request: Request<Body>) -> ProxyResult<Response<Body>> {
        let (parts, body) = request.into_parts();
        let response = self.forwarder.forward(parts, body).await?;
        Ok(response.map(Body::new))
    }

    async fn enforce(&self, rule: &Rule, request: Request<Body>) -> ProxyResult<Response<Body>> {
        let (parts, body) = request.into_parts();
        let request_inspector = RequestInspector::new(rule);

        request_inspector
            .inspect_head(&parts.headers)
            .into_result()
            .map_err(|violation| denied(rule, Stage::RequestCheck, violation))?;

        let body = if rule.inspects_request_body() {
            let captured = capture_request(rule, body).await?;
            request_inspector
                .inspect_body(captured.inspection_view())
                .into_result()
                .map_err(|violation| denied(rule, Stage::RequestCheck, violation))?;
            captured.forward_view()
        } else {
            body
        };

        let upstream_timeout = self.forwarder.upstream_timeout();
        let deadline = Instant::now() + upstream_timeout;
        let response = self.forwarder.forward(parts, body).await?;
        let (response_parts, response_body) = response.into_parts();
        let response_inspector = ResponseInspector::new(rule);

        // From here on the upstream response is either delivered whole or dropped.
        response_inspector
            .inspect_head(response_parts.status, &response_parts.headers)
            .into_result()
            .map_err(|violation| denied(rule, Stage::ResponseCheck, violation))?;

        let captured = timeout_at(deadline, capture_response(rule, response_body))
            .await
            .map_err(|_| {
                ProxyError::UpstreamUnavailable(format!(
                    "Upstream response body not complete after {upstream_timeout:?}"
                ))
            })??;
        response_inspector
            .inspect_body(captured.inspection_view())
            .into_result()
            .map_err(|violation| denied(rule, Stage::ResponseCheck, violation))?;

        debug!(
            stage = %Stage::Deliver,
            rule = rule.endpoint(),
            status = response_parts.status.as_u16(),
            body_bytes = captured.inspection_view().len(),
            "Exchange allowed"
        );
        Ok(Response::from_parts(response_parts, captured.forward_view()))
    }
}

fn denied(rule: &Rule, stage: Stage, violation: Violation) -> ProxyError {
    warn!(
        stage = %stage,
        rule = rule.endpoint(),
        violation = %violation,
        "Exchange denied by policy"
    );
    ProxyError::PolicyViolation(violation)
}

async fn capture_request(rule: &Rule, body: Body) -> ProxyResult<CapturedBody> {
    let limit = rule.max_request_length();
    capture(body, limit).await.map_err(|e| match e {
        CaptureError::LimitExceeded(limit) => denied(
            rule,
            Stage::RequestCheck,
            Violation::RequestTooLarge {
                declared: None,
                limit: *limit.as_ref(),
            },
        ),
        CaptureError::Read(e) => ProxyError::MalformedInbound(format!("Body read error: {e}")),
    })
}

async fn capture_response(
    rule: &Rule,
    body: hyper::body::Incoming,
) -> ProxyResult<CapturedBody> {
    let limit = rule.max_response_length();
    capture(body, limit).await.map_err(|e| match e {
        CaptureError::LimitExceeded(limit) => denied(
            rule,
            Stage::ResponseCheck,
            Violation::ResponseTooLarge {
                declared: None,
                limit: *limit.as_ref(),
            },
        ),
        CaptureError::Read(e) => {
            ProxyError::UpstreamUnavailable(format!("Upstream body read error: {e}"))
        }
    })
}
