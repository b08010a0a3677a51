//! Decoding of loosely-shaped RPC results.
//!
//! Backend functions return the same logical value in different JSON shapes
//! depending on how the function was written: a bare string, a one-element
//! array, or a wrapping object whose timestamp field may itself be epoch
//! millis, an ISO-8601 string, or a `{seconds, nanos}` pair. Rather than
//! shape-sniffing at each call site, this module decodes the known union of
//! shapes once and fails loudly on anything unrecognized.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

/// Error raised when an RPC result does not match any known shape.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcShapeError {
    #[error("unrecognized RPC shape: {0}")]
    Unrecognized(String),

    #[error("expected exactly one element, got {0}")]
    WrongArity(usize),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Known shapes of the signed-URL envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignedUrlEnvelope {
    Url(String),
    UrlList(Vec<String>),
    Object {
        url: String,
        #[serde(default, rename = "expiresAt")]
        expires_at: Option<ExpiryValue>,
    },
}

/// Known shapes of a timestamp field across backend function styles.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiryValue {
    Millis(u64),
    Iso(String),
    Timestamp {
        seconds: i64,
        #[serde(default)]
        nanos: u32,
    },
}

/// A decoded signed-URL response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSignedUrl {
    pub url: String,
    /// Server-reported expiry in epoch milliseconds, when present.
    pub expires_at_ms: Option<u64>,
}

/// Decode a signing RPC response into a URL and optional expiry.
///
/// Fails with [`RpcShapeError::Unrecognized`] instead of silently defaulting
/// when the payload matches none of the known shapes.
pub fn decode_signed_url_envelope(value: Value) -> Result<DecodedSignedUrl, RpcShapeError> {
    let shape = shape_name(&value);
    let envelope: SignedUrlEnvelope = serde_json::from_value(value)
        .map_err(|_| RpcShapeError::Unrecognized(shape.to_string()))?;

    match envelope {
        SignedUrlEnvelope::Url(url) => Ok(DecodedSignedUrl {
            url,
            expires_at_ms: None,
        }),
        SignedUrlEnvelope::UrlList(mut urls) => {
            if urls.len() != 1 {
                return Err(RpcShapeError::WrongArity(urls.len()));
            }
            Ok(DecodedSignedUrl {
                url: urls.remove(0),
                expires_at_ms: None,
            })
        }
        SignedUrlEnvelope::Object { url, expires_at } => {
            let expires_at_ms = expires_at.map(decode_expiry).transpose()?;
            Ok(DecodedSignedUrl { url, expires_at_ms })
        }
    }
}

fn decode_expiry(value: ExpiryValue) -> Result<u64, RpcShapeError> {
    match value {
        ExpiryValue::Millis(ms) => Ok(ms),
        ExpiryValue::Iso(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.timestamp_millis().max(0) as u64)
            .map_err(|_| RpcShapeError::InvalidTimestamp(raw)),
        ExpiryValue::Timestamp { seconds, nanos } => {
            let ms = seconds.max(0) as u64 * 1_000 + u64::from(nanos) / 1_000_000;
            Ok(ms)
        }
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
