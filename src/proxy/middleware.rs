//! Middleware implementations for the firewall service

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Logging middleware - logs request/response details with timing
///
/// Each request gets a v7 UUID that only appears in the log span; nothing is
/// added to the traffic itself.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::now_v7();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        info!("Incoming request");

        let response = next.run(request).await;

        info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Request completed"
        );
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_logging_middleware_is_transparent() {
        let app = Router::new()
            .fallback(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") })
            .layer(from_fn(logging_middleware));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/kettle")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert!(!response.headers().contains_key("x-request-id"));
    }
}
