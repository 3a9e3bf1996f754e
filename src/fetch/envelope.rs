// src/fetch/envelope.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::UnwrapError;
use crate::raw::{json_type, RawTree};

static CALLBACK_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\(").expect("callback prefix regex should parse"));
static CALLBACK_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\)\s*;?\s*$").expect("callback suffix regex should parse"));

/// Strip a JSONP wrapper such as `1580886754(...)`. Each side is removed
/// only when present, so bare JSON passes through untouched.
pub fn strip_callback(body: &str) -> &str {
    let start = CALLBACK_PREFIX.find(body).map_or(0, |m| m.end());
    let rest = &body[start..];
    let end = CALLBACK_SUFFIX.find(rest).map_or(rest.len(), |m| m.start());
    &rest[..end]
}

/// Decode a `disease_h5` response body into a `RawTree`.
///
/// The outer JSON is an envelope whose `data` member is itself JSON encoded
/// as a string; an already-decoded object is accepted as well.
pub fn unwrap_envelope(body: &str) -> Result<RawTree, UnwrapError> {
    let inner = strip_callback(body);
    trace!(body_len = body.len(), inner_len = inner.len(), "stripped callback");

    let mut envelope: Value = serde_json::from_str(inner)
        .map_err(|source| UnwrapError::Json { stage: "envelope", source })?;
    let data = envelope
        .get_mut("data")
        .map(Value::take)
        .ok_or(UnwrapError::MissingData)?;

    let payload = match data {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|source| UnwrapError::Json { stage: "data", source })?,
        obj @ Value::Object(_) => obj,
        Value::Null => return Err(UnwrapError::MissingData),
        other => return Err(UnwrapError::InvalidData(json_type(&other))),
    };

    // only a non-object payload fails here; member shapes are checked while reshaping
    RawTree::from_value(payload).map_err(|source| UnwrapError::Json { stage: "payload", source })
}
