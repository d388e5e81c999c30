//! HTTP header constants for the firewall
//!
//! This module centralizes the header names and values the firewall writes
//! itself. Everything else is relayed exactly as received.

use ::http::header;

/// Content type of the fixed denial and error responses
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Value for `x-content-type-options` on the fixed responses
pub const NOSNIFF: &str = "nosniff";

/// Standard header re-exports for convenience
pub use header::{CONTENT_TYPE, HOST, X_CONTENT_TYPE_OPTIONS};

/// Well-known paths
pub mod paths {
    /// Path used when a request URI carries none
    pub const DEFAULT: &str = "/";
}
