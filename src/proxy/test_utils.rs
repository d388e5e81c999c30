//! Test utilities for proxy module testing
//!
//! Mock upstream services, firewall construction from inline YAML rules and
//! small response helpers.

#[cfg(test)]
pub mod test_helpers {
    use crate::policy::rules_from_yaml;
    use crate::proxy::{FirewallService, ProxyConfig, TargetUrl};
    use axum::{body::Body, http::StatusCode, response::IntoResponse, Router};
    use bytes::Bytes;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Serve `app` on an ephemeral local port
    pub async fn spawn_backend(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("test backend should bind");
        let addr = listener.local_addr().expect("bound listener has an address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test backend failed");
        });

        addr
    }

    /// Build a firewall router in front of `upstream` with the given YAML rules
    pub fn firewall(upstream: SocketAddr, rules_yaml: &str) -> Router {
        firewall_with_timeout(upstream, rules_yaml, Duration::from_secs(5))
    }

    pub fn firewall_with_timeout(
        upstream: SocketAddr,
        rules_yaml: &str,
        upstream_timeout: Duration,
    ) -> Router {
        let rules = rules_from_yaml(rules_yaml).expect("test rules should compile");
        let target =
            TargetUrl::try_new(format!("http://{upstream}")).expect("test target is valid");
        let config = ProxyConfig::new(target).with_upstream_timeout(upstream_timeout);
        FirewallService::new(config, rules).into_router()
    }

    /// How a [`streaming_backend`] body ends after its chunks
    #[derive(Clone, Copy, Debug)]
    pub enum StreamEnd {
        Complete,
        Fail,
        Stall,
    }

    /// Upstream answering every request with a chunked body made of `chunks`
    ///
    /// The body never announces its length, so only a capped read can bound it.
    pub fn streaming_backend(chunks: &'static [&'static [u8]], end: StreamEnd) -> Router {
        use futures_util::{stream, StreamExt};

        Router::new().fallback(move || async move {
            let data = stream::iter(
                chunks
                    .iter()
                    .copied()
                    .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk))),
            );
            let body = match end {
                StreamEnd::Complete => Body::from_stream(data),
                StreamEnd::Fail => Body::from_stream(data.chain(stream::once(async {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "upstream crashed",
                    ))
                }))),
                StreamEnd::Stall => Body::from_stream(data.chain(stream::pending())),
            };
            (StatusCode::OK, [("x-upstream", "stream")], body)
        })
    }

    /// Upstream that echoes the request back as JSON
    pub async fn echo_handler(
        req: axum::extract::Request,
    ) -> Result<impl IntoResponse, StatusCode> {
        let (parts, body) = req.into_parts();
        let body_bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let response_body = serde_json::json!({
            "method": parts.method.to_string(),
            "uri": parts.uri.to_string(),
            "headers": parts.headers.iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect::<Vec<_>>(),
            "body": String::from_utf8_lossy(&body_bytes),
        });

        Ok((StatusCode::OK, axum::Json(response_body)))
    }

    pub fn echo_backend() -> Router {
        Router::new().fallback(echo_handler)
    }

    /// Upstream that counts the requests it receives
    #[derive(Clone, Default)]
    pub struct SpyBackend {
        calls: Arc<AtomicUsize>,
    }

    impl SpyBackend {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Router answering every request with `status` and `body`
        pub fn router(&self, status: StatusCode, body: &'static str) -> Router {
            let calls = Arc::clone(&self.calls);
            Router::new().fallback(move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (status, [("x-upstream", "spy")], body)
                }
            })
        }
    }

    pub async fn body_bytes(response: axum::response::Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body should be readable")
    }

    pub fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("test request should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_spy_backend_counts_calls() {
        let spy = SpyBackend::default();
        let addr = spawn_backend(spy.router(StatusCode::OK, "hi")).await;

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build_http::<axum::body::Body>();
        let uri = format!("http://{addr}/ping").parse().unwrap();
        let response = client.get(uri).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(spy.calls(), 1);
    }
}
