//! Unverified token decoding.
//!
//! Tokens are only parsed for structure. No signature, `exp`, `aud` or `iss` check
//! is ever performed here; the claim is used as a routing/rate-limit key, not as proof
//! of identity.

use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Algorithm;
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded claim set (JWT payload object).
pub type Claims = Map<String, Value>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 token segments, got {0}")]
    Segments(usize),
    #[error("token header has no string 'alg'")]
    MissingAlg,
    #[error("unsupported token alg: {0:?}")]
    UnsupportedAlg(String),
    #[error("invalid segment encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid segment json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes a token's claim set without verifying it.
pub trait ClaimsDecoder: Send + Sync {
    fn decode_unverified(&self, token: &str) -> Result<Claims, DecodeError>;
}

/// Compact-serialized JWT (`header.payload.signature`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtClaimsDecoder;

impl ClaimsDecoder for JwtClaimsDecoder {
    fn decode_unverified(&self, token: &str) -> Result<Claims, DecodeError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, _] = segments.as_slice() else {
            return Err(DecodeError::Segments(segments.len()));
        };

        // Any JSON object is accepted as header as long as `alg` is known.
        let header: Map<String, Value> = decode_segment(header)?;
        match header.get("alg").and_then(Value::as_str) {
            None => return Err(DecodeError::MissingAlg),
            Some("none") => {}
            Some(alg) => {
                Algorithm::from_str(alg)
                    .map_err(|_| DecodeError::UnsupportedAlg(alg.to_string()))?;
            }
        }

        decode_segment(payload)
    }
}

fn decode_segment(segment: &str) -> Result<Map<String, Value>, DecodeError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encode(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    fn token_with(header: &Value, payload: &str) -> String {
        format!("{}.{}.c2ln", encode(header), payload)
    }

    #[test]
    fn decodes_payload_regardless_of_signature_and_expiry() {
        let payload = encode(&json!({ "sub": "u1", "exp": 1 }));
        let token = token_with(&json!({ "alg": "HS256", "typ": "JWT" }), &payload);

        let claims = JwtClaimsDecoder.decode_unverified(&token).unwrap();

        assert_eq!(claims.get("sub"), Some(&json!("u1")));
    }

    #[test]
    fn non_token_string_is_rejected() {
        let err = JwtClaimsDecoder.decode_unverified("invalid").unwrap_err();
        assert!(matches!(err, DecodeError::Segments(1)));
    }

    #[test]
    fn unknown_alg_is_rejected() {
        let payload = encode(&json!({ "sub": "u1" }));
        let token = token_with(&json!({ "alg": "nope" }), &payload);

        assert!(matches!(
            JwtClaimsDecoder.decode_unverified(&token),
            Err(DecodeError::UnsupportedAlg(alg)) if alg == "nope"
        ));

        let token = token_with(&json!({ "typ": "JWT" }), &payload);
        assert!(matches!(
            JwtClaimsDecoder.decode_unverified(&token),
            Err(DecodeError::MissingAlg)
        ));
    }

    #[test]
    fn header_may_carry_non_string_fields() {
        let payload = encode(&json!({ "customer_id": "u" }));
        let token = token_with(&json!({ "alg": "HS256", "typ": "JWT", "ver": 1 }), &payload);

        let claims = JwtClaimsDecoder.decode_unverified(&token).unwrap();

        assert_eq!(claims.get("customer_id"), Some(&json!("u")));
    }

    #[test]
    fn alg_none_is_accepted() {
        let payload = encode(&json!({ "customer_id": "u" }));
        let token = format!("{}.{}.", encode(&json!({ "alg": "none" })), payload);

        let claims = JwtClaimsDecoder.decode_unverified(&token).unwrap();

        assert_eq!(claims.get("customer_id"), Some(&json!("u")));
    }

    #[test]
    fn payload_must_be_a_json_object() {
        let header = json!({ "alg": "HS256" });

        let not_base64 = token_with(&header, "***");
        assert!(matches!(
            JwtClaimsDecoder.decode_unverified(&not_base64),
            Err(DecodeError::Base64(_))
        ));

        let array = token_with(&header, &encode(&json!(["a"])));
        assert!(matches!(
            JwtClaimsDecoder.decode_unverified(&array),
            Err(DecodeError::Json(_))
        ));
    }
}
