//! Unverified JWT claim inspection.
//!
//! The client never validates signatures; it only reads `exp` to decide
//! whether a stored access token is still worth sending. Anything that cannot
//! be decoded counts as expired.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Returns the `exp` claim of a JWT, or `None` when the token is malformed.
pub fn expires_at(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    // Some issuers keep the base64 padding.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: ExpiryClaims = serde_json::from_slice(&bytes).ok()?;
    claims.exp
}

/// True when the token has expired at `now` (unix seconds) or cannot be decoded.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match expires_at(token) {
        Some(exp) => exp < now,
        None => true,
    }
}

/// True when the token has expired or cannot be decoded.
pub fn is_access_token_expired(token: &str) -> bool {
    is_expired_at(token, OffsetDateTime::now_utc().unix_timestamp())
}

#[cfg(test)]
pub(crate) fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_exp_claim() {
        let token = make_token(&json!({"exp": 1_700_000_000, "user_id": 1}));
        assert_eq!(expires_at(&token), Some(1_700_000_000));
        assert!(!is_expired_at(&token, 1_699_999_999));
        assert!(!is_expired_at(&token, 1_700_000_000));
        assert!(is_expired_at(&token, 1_700_000_001));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_access_token_expired(""));
        assert!(is_access_token_expired("a1"));
        assert!(is_access_token_expired("a.b"));
        assert!(is_access_token_expired("a.!!!.c"));
        assert!(is_access_token_expired("a.b.c.d"));
        // Valid base64 but not JSON.
        let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("hello"));
        assert!(is_access_token_expired(&not_json));
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let token = make_token(&json!({"user_id": 1}));
        assert!(is_access_token_expired(&token));
    }

    #[test]
    fn test_future_token_is_valid() {
        let exp = OffsetDateTime::now_utc().unix_timestamp() + 3600;
        let token = make_token(&json!({"exp": exp}));
        assert!(!is_access_token_expired(&token));
    }
}
