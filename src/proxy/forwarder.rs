//! Upstream forwarding
//!
//! The forwarder relays a request to the protected service and hands back the
//! upstream response untouched, body still streaming. Whether the body it
//! sends is a captured buffer or the live inbound stream is the caller's
//! decision. Failures are never retried.

use crate::proxy::headers::HOST;
use crate::proxy::types::*;
use crate::proxy::url_resolver::UrlResolver;
use axum::body::Body;
use hyper::body::Incoming;
use hyper::{Request, Response, Version};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Client side of the proxy
#[derive(Clone)]
pub struct Forwarder {
    config: Arc<ProxyConfig>,
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new(config: ProxyConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .http1_title_case_headers(true)
            .http1_preserve_header_case(true)
            .build_http();

        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn target_url(&self) -> &TargetUrl {
        &self.config.target_url
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.config.upstream_timeout
    }

    /// Send `body` upstream with the method, headers and path of `parts`
    pub async fn forward(
        &self,
        mut parts: http::request::Parts,
        body: Body,
    ) -> ProxyResult<Response<Incoming>> {
        let start_time = Instant::now();

        parts.uri = UrlResolver::resolve_target_uri(&self.config.target_url, &parts.uri)?;
        // The client derives Host from the target URI and only speaks HTTP/1.1 upstream.
        parts.headers.remove(HOST);
        parts.version = Version::HTTP_11;

        let method = parts.method.clone();
        let uri = parts.uri.clone();
        let outgoing_request = Request::from_parts(parts, body);

        // Forward the request with timeout
        let response_future = self.client.request(outgoing_request);
        let timeout_duration = self.config.upstream_timeout;

        let response = tokio::time::timeout(timeout_duration, response_future)
            .await
            .map_err(|_| {
                ProxyError::UpstreamUnavailable(format!(
                    "Upstream timed out after {timeout_duration:?}"
                ))
            })?
            .map_err(|e| ProxyError::UpstreamUnavailable(format!("Connection error: {e}")))?;

        debug!(
            stage = %Stage::Forward,
            method = %method,
            uri = %uri,
            status = response.status().as_u16(),
            duration_ms = start_time.elapsed().as_millis(),
            "Upstream responded"
        );

        Ok(response)
    }
}
