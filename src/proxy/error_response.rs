//! Fixed client-visible error responses
//!
//! The firewall only ever produces three responses of its own. Each carries
//! a constant plain-text body, so a rejected client learns nothing about
//! which predicate fired or what the upstream answered.

use crate::proxy::headers::{CONTENT_TYPE, NOSNIFF, TEXT_PLAIN_UTF8, X_CONTENT_TYPE_OPTIONS};
use crate::proxy::types::{ProxyError, BAD_GATEWAY_BODY, BAD_REQUEST_BODY, FORBIDDEN_BODY};
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Extension trait mapping proxy failures onto their fixed responses
pub trait ErrorResponseExt {
    /// Get the appropriate HTTP status code
    fn status_code(&self) -> StatusCode;

    /// The constant body sent to the client
    fn client_message(&self) -> &'static str;
}

impl ErrorResponseExt for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::PolicyViolation(_) => StatusCode::FORBIDDEN,
            ProxyError::MalformedInbound(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            ProxyError::PolicyViolation(_) => FORBIDDEN_BODY,
            ProxyError::MalformedInbound(_) => BAD_REQUEST_BODY,
            ProxyError::UpstreamUnavailable(_) => BAD_GATEWAY_BODY,
        }
    }
}

/// Build one of the fixed plain-text responses
pub fn fixed_response(status: StatusCode, message: &'static str) -> Response {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
    response
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        fixed_response(self.status_code(), self.client_message())
    }
}
