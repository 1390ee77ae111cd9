//! Recovery of JSON documents from free-form model output.
//!
//! Models wrap JSON in markdown fences or surrounding prose even when told to
//! answer with JSON only. [`extract_json`] strips that wrapping before a strict
//! decode; [`decode`] adds a per-call policy for what happens when that fails.

use crate::error::ParseError;
use log::*;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn object_pattern() -> &'static Regex {
    static OBJECT: OnceLock<Regex> = OnceLock::new();
    OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid object pattern"))
}

fn array_pattern() -> &'static Regex {
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    ARRAY.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid array pattern"))
}

/// What to do when a response cannot be decoded.
pub enum ParsePolicy<T> {
    /// Surface the [`ParseError`] to the caller.
    Fail,
    /// Build a best-effort value from the raw response text instead.
    Degrade(fn(&str) -> T),
}

/// Extract and strictly decode the JSON document embedded in `text`.
///
/// A reply that is JSON once fences are stripped is decoded as-is. Otherwise, or
/// when that decode fails (prose after the closing fence), the widest embedded
/// object or array is tried instead.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let unfenced = strip_fence(text);
    if unfenced.starts_with('{') || unfenced.starts_with('[') {
        match serde_json::from_str(unfenced) {
            Ok(value) => return Ok(value),
            Err(e) => debug!("Unfenced reply is not valid JSON ({}), scanning for a document", e),
        }
    }

    let candidate = scan_json(text).ok_or_else(|| {
        ParseError::new("no JSON object or array found in response", text)
    })?;

    serde_json::from_str(candidate)
        .map_err(|e| ParseError::new(format!("invalid JSON: {}", e), text))
}

/// Decode `text` according to `policy`.
pub fn decode<T: DeserializeOwned>(text: &str, policy: ParsePolicy<T>) -> Result<T, ParseError> {
    match extract_json(text) {
        Ok(value) => Ok(value),
        Err(err) => match policy {
            ParsePolicy::Fail => Err(err),
            ParsePolicy::Degrade(fallback) => {
                warn!("Degrading unparseable model response: {}", err);
                Ok(fallback(text))
            }
        },
    }
}

/// Widest object or array in `text`, preferring whichever starts first.
fn scan_json(text: &str) -> Option<&str> {
    let object = object_pattern().find(text);
    let array = array_pattern().find(text);
    match (object, array) {
        (Some(object), Some(array)) if array.start() < object.start() => Some(array.as_str()),
        (Some(object), _) => Some(object.as_str()),
        (None, Some(array)) => Some(array.as_str()),
        (None, None) => None,
    }
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````.
fn strip_fence(text: &str) -> &str {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix("```json") {
        inner = rest;
    } else if let Some(rest) = inner.strip_prefix("```") {
        inner = rest;
    }
    if let Some(rest) = inner.strip_suffix("```") {
        inner = rest;
    }
    inner.trim()
}
