//! `Retry-After` header parsing.

use std::time::SystemTime;

use log::*;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Seconds to wait according to a `Retry-After` header.
///
/// Accepts both forms allowed by RFC 9110: delay-seconds and an HTTP-date.
/// Dates in the past yield zero.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    match httpdate::parse_http_date(value) {
        Ok(when) => Some(
            when.duration_since(SystemTime::now())
                .map(|d| d.as_secs())
                .unwrap_or(0),
        ),
        Err(_) => {
            debug!("Ignoring unparseable Retry-After header: {}", value);
            None
        }
    }
}
