//! Upstream URI composition
//!
//! The upstream URI is the configured base address followed by the original
//! path and query exactly as received. Percent-escapes, duplicate slashes and
//! query ordering are all left untouched, since any rewrite could change how
//! the upstream routes the request.

use crate::proxy::headers::paths;
use crate::proxy::types::*;
use hyper::Uri;

/// Strategy for building the outgoing request URI
pub struct UrlResolver;

impl UrlResolver {
    /// Concatenate the target base address with the original path and query
    pub fn resolve_target_uri(target_url: &TargetUrl, original_uri: &Uri) -> ProxyResult<Uri> {
        let path_and_query = original_uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(paths::DEFAULT);

        let target = target_url.as_ref();
        let final_uri_str = format!("{target}{path_and_query}");

        final_uri_str.parse().map_err(|e| {
            ProxyError::UpstreamUnavailable(format!("Invalid upstream URI '{final_uri_str}': {e}"))
        })
    }
}
