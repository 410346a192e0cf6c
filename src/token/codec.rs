//! Token Codec
//!
//! Structural decoding of compact three-part tokens. No signature check is
//! performed: only the payload segment is read.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::{Expiration, Payload};

/// base64url engine accepting both padded and unpadded input.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the payload segment of a token.
pub fn decode(token: &str) -> Result<Payload, DecodeError> {
    let segment = token
        .split('.')
        .nth(1)
        .ok_or(DecodeError::MissingPayload)?;

    let bytes = SEGMENT_ENGINE
        .decode(segment)
        .map_err(|e| DecodeError::InvalidBase64 {
            message: e.to_string(),
        })?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|e| DecodeError::InvalidJson {
        message: e.to_string(),
    })?;

    match value {
        Value::Object(claims) => Ok(Payload::new(claims)),
        other => Err(DecodeError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Expiration instant of a payload in milliseconds.
///
/// A payload without `exp` never expires.
pub fn expiration_instant(payload: &Payload) -> Result<Expiration, DecodeError> {
    let exp = match payload.exp() {
        Some(exp) => exp,
        None => return Ok(Expiration::Never),
    };

    if let Some(secs) = exp.as_i64() {
        return secs
            .checked_mul(1000)
            .map(Expiration::At)
            .ok_or_else(|| DecodeError::InvalidExpiration {
                message: format!("{} overflows the millisecond clock", secs),
            });
    }

    match exp.as_f64() {
        Some(secs) if secs.is_finite() => Ok(Expiration::At((secs * 1000.0).round() as i64)),
        _ => Err(DecodeError::InvalidExpiration {
            message: format!("expected a number, found {}", json_type_name(exp)),
        }),
    }
}

/// Decode a token and return its expiration.
pub fn decode_expiration(token: &str) -> Result<Expiration, DecodeError> {
    expiration_instant(&decode(token)?)
}

/// Build an unsigned token around `claims`.
///
/// The header declares `"alg": "none"` and the signature segment is empty.
/// Useful for fixtures and local development servers.
pub fn encode_unsigned(claims: &Map<String, Value>) -> String {
    let header = SEGMENT_ENGINE.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = serde_json::to_vec(claims).unwrap_or_default();
    format!("{}.{}.", header, SEGMENT_ENGINE.encode(body))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn token_with_segment(segment: &[u8]) -> String {
        format!("e30.{}.sig", SEGMENT_ENGINE.encode(segment))
    }

    #[test]
    fn test_exp_round_trip_is_exact() {
        for exp in [0_i64, 1, 1_700_000_000, 4_102_444_800] {
            let token = encode_unsigned(&claims(json!({ "exp": exp })));
            let payload = decode(&token).unwrap();
            assert_eq!(expiration_instant(&payload).unwrap(), Expiration::At(exp * 1000));
        }
    }

    #[test]
    fn test_decode_reads_claims() {
        let token = encode_unsigned(&claims(json!({ "sub": "user-1", "iat": 10 })));
        let payload = decode(&token).unwrap();
        assert_eq!(payload.subject(), Some("user-1"));
        assert_eq!(payload.get("iat"), Some(&json!(10)));
    }

    #[test]
    fn test_missing_exp_never_expires() {
        let token = encode_unsigned(&claims(json!({ "sub": "user-1" })));
        assert_eq!(decode_expiration(&token).unwrap(), Expiration::Never);
    }

    #[test]
    fn test_fractional_exp() {
        let token = encode_unsigned(&claims(json!({ "exp": 1.5 })));
        assert_eq!(decode_expiration(&token).unwrap(), Expiration::At(1500));
    }

    #[test]
    fn test_single_segment_is_rejected() {
        assert_eq!(decode("invalidJWT"), Err(DecodeError::MissingPayload));
    }

    #[test]
    fn test_invalid_base64() {
        let result = decode("header.***.sig");
        assert!(matches!(result, Err(DecodeError::InvalidBase64 { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = decode(&token_with_segment(b"{not json"));
        assert!(matches!(result, Err(DecodeError::InvalidJson { .. })));
    }

    #[test]
    fn test_scalar_payload_is_an_anomaly() {
        let result = decode(&token_with_segment(b"42"));
        assert_eq!(result, Err(DecodeError::NotAnObject { found: "number" }));

        let result = decode(&token_with_segment(b"\"text\""));
        assert_eq!(result, Err(DecodeError::NotAnObject { found: "string" }));
    }

    #[test]
    fn test_padded_segment_is_accepted() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":70}"#);
        assert!(padded.ends_with('='));
        let token = format!("e30.{}.sig", padded);
        assert_eq!(decode_expiration(&token).unwrap(), Expiration::At(70_000));
    }

    #[test]
    fn test_non_numeric_exp() {
        let token = encode_unsigned(&claims(json!({ "exp": "tomorrow" })));
        let result = decode_expiration(&token);
        assert!(matches!(result, Err(DecodeError::InvalidExpiration { .. })));
    }
}
