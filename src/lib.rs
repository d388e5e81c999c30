//! Inline firewall - a policy-enforcing reverse proxy
//!
//! Every request addressed to the protected service passes through this proxy.
//! The first rule whose endpoint prefixes the request path decides whether the
//! request may be forwarded and whether the upstream's response may be
//! delivered; requests no rule covers are relayed untouched.

pub mod application;
pub mod cli;
pub mod config;
pub mod error;
pub mod policy;
pub mod proxy;

pub use application::Application;
pub use error::{Error, Result};
