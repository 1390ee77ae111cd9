//! HTTP client building and response helpers.

mod client;
mod retry_after;

pub use client::{AuthenticatedClient, AuthenticatedClientBuilder, HttpClientConfig};
pub use retry_after::parse_retry_after;
