//! Body capture for inspection
//!
//! A body that has to be inspected is read exactly once into an owned buffer.
//! The buffer then offers two independent views: a byte slice for the
//! inspectors and a fresh [`Body`] for forwarding or delivery. Cloning
//! [`Bytes`] shares the allocation, so neither view can drain the other.

use crate::policy::ByteLimit;
use axum::body::Body;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while capturing a body
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("body exceeds limit of {0} bytes")]
    LimitExceeded(ByteLimit),

    #[error("failed to read body: {0}")]
    Read(BoxError),
}

/// A fully materialized body
#[derive(Clone, Debug, Default)]
pub struct CapturedBody {
    bytes: Bytes,
}

impl CapturedBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Read-only view for pattern inspection
    pub fn inspection_view(&self) -> &[u8] {
        &self.bytes
    }

    /// Independent body carrying the same bytes, for the next hop
    pub fn forward_view(&self) -> Body {
        Body::from(self.bytes.clone())
    }
}

/// Read `body` to the end, refusing to buffer more than `limit` bytes
pub async fn capture<B>(body: B, limit: ByteLimit) -> Result<CapturedBody, CaptureError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let collected = match limit.as_buffer_limit() {
        Some(max) => Limited::new(body, max).collect().await.map_err(|e| {
            if e.is::<LengthLimitError>() {
                CaptureError::LimitExceeded(limit)
            } else {
                CaptureError::Read(e)
            }
        })?,
        None => body
            .collect()
            .await
            .map_err(|e| CaptureError::Read(e.into()))?,
    };

    Ok(CapturedBody::new(collected.to_bytes()))
}
