//! Offline JWT expiry decoding
//!
//! Reads the `exp` claim from the payload segment. The signature is not
//! verified; the backend is the authority, this only decides when to refresh.

use crate::error::CoreError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bookkeep_types::DecodedExpiry;
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// Decode the `exp` claim of `token`
///
/// Returns `Ok(None)` for a well-formed token without an expiry claim, and
/// `Err(TokenDecode)` when the token cannot be read at all.
pub fn decode_expiry(token: &str) -> Result<Option<DecodedExpiry>, CoreError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(decode_err("expected three dot-separated segments"));
    };

    // Some issuers pad the segments anyway
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| decode_err(format!("payload is not base64url: {e}")))?;

    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| decode_err(format!("payload is not a JSON object: {e}")))?;

    let exp = match claims.exp {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| decode_err("exp is out of range"))?,
        Some(_) => return Err(decode_err("exp is not numeric")),
    };

    Ok(Some(DecodedExpiry {
        expires_at_epoch_seconds: exp,
    }))
}

fn decode_err(reason: impl Into<String>) -> CoreError {
    CoreError::TokenDecode {
        reason: reason.into(),
    }
}
