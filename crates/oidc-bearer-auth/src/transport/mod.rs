//! Transport layer
//!
//! Serves the authentication pipeline over HTTP

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{router, run_http};
