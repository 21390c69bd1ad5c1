//! Local access-token expiry inspection.
//!
//! The backend's tokens are three-segment signed tokens whose payload
//! carries an `exp` claim (Unix seconds). The client decodes that one claim
//! without verifying the signature: local expiry only decides when to
//! *proactively* refresh, it is never authoritative for invalidation.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use serde::Deserialize;

/// Safety margin before the real expiry at which a token counts as stale.
const EXPIRY_MARGIN_MS: i64 = 60_000;

/// The single claim the client reads out of a token payload.
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    /// Expiration timestamp (seconds since epoch).
    exp: i64,
}

/// Decode the `exp` claim of a token, in milliseconds since epoch.
///
/// Returns `None` for anything that is not a well-formed three-segment
/// token with a base64 JSON payload carrying a numeric `exp`.
pub fn decoded_expiry_ms(token: &str) -> Option<i64> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    // Tokens are url-safe base64 without padding, but some backends emit
    // standard-alphabet payloads.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD.decode(payload))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    Some(claim.exp.checked_mul(1000)?)
}

/// Whether a token is locally expired at the given instant (ms since epoch).
///
/// Absent, empty, or malformed tokens are always expired: there is nothing
/// usable to present, so the caller should try to refresh.
pub fn is_locally_expired_at(token: Option<&str>, now_ms: i64) -> bool {
    let Some(token) = token else {
        return true;
    };
    if token.is_empty() {
        return true;
    }
    match decoded_expiry_ms(token) {
        Some(expiry_ms) => now_ms >= expiry_ms - EXPIRY_MARGIN_MS,
        None => true,
    }
}

/// Whether a token is locally expired right now.
pub fn is_locally_expired(token: Option<&str>) -> bool {
    is_locally_expired_at(token, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned three-segment token with the given exp claim.
    fn make_token(exp_seconds: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp_seconds}}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let exp = 2_000_000_000i64;
        let token = make_token(exp);
        // One millisecond before the margin boundary.
        let now_ms = exp * 1000 - EXPIRY_MARGIN_MS - 1;
        assert!(!is_locally_expired_at(Some(&token), now_ms));
    }

    #[test]
    fn test_token_expires_at_margin_boundary() {
        let exp = 2_000_000_000i64;
        let token = make_token(exp);
        let boundary_ms = exp * 1000 - EXPIRY_MARGIN_MS;
        assert!(is_locally_expired_at(Some(&token), boundary_ms));
        assert!(is_locally_expired_at(Some(&token), boundary_ms + 1));
    }

    #[test]
    fn test_none_and_empty_are_expired() {
        assert!(is_locally_expired_at(None, 0));
        assert!(is_locally_expired_at(Some(""), 0));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_locally_expired_at(Some("not-a-token"), 0));
        assert!(is_locally_expired_at(Some("one.two"), 0));
        assert!(is_locally_expired_at(Some("one.two.three.four"), 0));
        assert!(is_locally_expired_at(Some("a.!!notbase64!!.c"), 0));
    }

    #[test]
    fn test_payload_without_exp_is_expired() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"u1"}"#);
        let token = format!("{header}.{payload}.sig");
        assert!(is_locally_expired_at(Some(&token), 0));
    }

    #[test]
    fn test_standard_alphabet_payload_decodes() {
        let header = STANDARD.encode(r#"{"alg":"HS256"}"#);
        let payload = STANDARD.encode(r#"{"exp":2000000000}"#);
        let token = format!("{header}.{payload}.sig");
        assert_eq!(decoded_expiry_ms(&token), Some(2_000_000_000_000));
    }

    #[test]
    fn test_decoded_expiry_ms() {
        let token = make_token(1_700_000_000);
        assert_eq!(decoded_expiry_ms(&token), Some(1_700_000_000_000));
    }
}
