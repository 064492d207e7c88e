//! Structural validation of bearer tokens.
//!
//! The session layer treats the token as opaque: it never verifies a
//! signature and never decides validity from the payload. It only checks
//! the *shape* (three non-empty, dot-separated, base64url-decodable
//! segments) before attaching it to a request.
//!
//! The one peek inside is [`BearerToken::expiry_claim`], used when
//! logging why the server rejected a token.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::SessionError;

/// A token that passed structural validation.
///
/// `Debug` prints a redacted form so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    /// Returns [`SessionError::MalformedToken`] naming the first defect
    /// found: wrong segment count, an empty segment, or a segment that
    /// isn't base64url.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(SessionError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(SessionError::MalformedToken(format!("segment {index} is empty")));
            }
            decode_segment(segment).ok_or_else(|| {
                SessionError::MalformedToken(format!("segment {index} is not base64url"))
            })?;
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns `true` if `raw` passes [`parse`](Self::parse).
    pub fn is_well_formed(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value: `Bearer <token>`.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Reads the optional `exp` claim (epoch seconds) from the payload
    /// segment and returns it in epoch milliseconds.
    ///
    /// Diagnostic only: validity is decided by the stored expiry.
    pub fn expiry_claim(&self) -> Option<i64> {
        let payload = self.0.split('.').nth(1)?;
        let bytes = decode_segment(payload)?;
        let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
        let exp = claims.get("exp")?.as_i64()?;
        exp.checked_mul(1000)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.chars().take(6).collect();
        write!(f, "BearerToken({head}…)")
    }
}

/// Decodes one base64url segment, tolerating trailing `=` padding.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        URL_SAFE_NO_PAD.encode(s)
    }

    fn token_with_payload(payload: &str) -> String {
        format!("{}.{}.{}", encode(r#"{"alg":"HS256"}"#), encode(payload), encode("sig"))
    }

    #[test]
    fn test_parse_three_base64url_segments_succeeds() {
        let raw = token_with_payload(r#"{"sub":1}"#);

        let token = BearerToken::parse(&raw).expect("well-formed");

        assert_eq!(token.as_str(), raw);
        assert_eq!(token.authorization(), format!("Bearer {raw}"));
    }

    #[test]
    fn test_parse_wrong_segment_count_fails() {
        assert!(!BearerToken::is_well_formed("abc.def"));
        assert!(!BearerToken::is_well_formed("abc.def.ghi.jkl"));
        assert!(!BearerToken::is_well_formed("abcdef"));
        assert!(!BearerToken::is_well_formed(""));
    }

    #[test]
    fn test_parse_empty_segment_fails() {
        let result = BearerToken::parse("abc..def");

        assert!(matches!(result, Err(SessionError::MalformedToken(m)) if m.contains("segment 1")));
    }

    #[test]
    fn test_parse_non_base64url_segment_fails() {
        // `+` and `/` belong to standard base64, not base64url.
        assert!(!BearerToken::is_well_formed("ab+c.def.ghi"));
        assert!(!BearerToken::is_well_formed("abc.d/ef.ghi"));
        assert!(!BearerToken::is_well_formed("abc.déf.ghi"));
    }

    #[test]
    fn test_parse_tolerates_padding() {
        let padded = format!("{}=.{}.{}", encode("ab"), encode("{}"), encode("s"));

        assert!(BearerToken::is_well_formed(&padded));
    }

    #[test]
    fn test_expiry_claim_reads_exp_in_millis() {
        let token = BearerToken::parse(&token_with_payload(r#"{"exp":1700000000}"#)).unwrap();

        assert_eq!(token.expiry_claim(), Some(1_700_000_000_000));
    }

    #[test]
    fn test_expiry_claim_missing_or_unreadable_is_none() {
        let no_exp = BearerToken::parse(&token_with_payload(r#"{"sub":1}"#)).unwrap();
        let not_json = BearerToken::parse(&token_with_payload("plain")).unwrap();

        assert_eq!(no_exp.expiry_claim(), None);
        assert_eq!(not_json.expiry_claim(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let raw = token_with_payload(r#"{"sub":1}"#);
        let token = BearerToken::parse(&raw).unwrap();

        let printed = format!("{token:?}");

        assert!(!printed.contains(&raw));
        assert!(printed.starts_with("BearerToken("));
    }
}
