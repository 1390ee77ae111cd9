//! # provider-auth
//!
//! Authentication and HTTP plumbing for the hosted AI vendors the report pipeline calls:
//! - API key authentication (custom header or Bearer token) per vendor
//! - Pre-configured vendor endpoints and rate-limit tuning
//! - HTTP client building with request deadlines
//! - `Retry-After` header parsing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use provider_auth::{
//!     api_key::{ApiKeyAuth, ApiKeyProvider},
//!     http::AuthenticatedClientBuilder,
//! };
//! ```

pub mod api_key;
pub mod error;
pub mod http;
pub mod providers;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
