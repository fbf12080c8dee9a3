//! Bearer token extraction from the `Authorization` header

use super::error::{AuthError, Result};
use super::identity::BearerToken;
use crate::constants::BEARER_SCHEME;

/// Parse the raw `Authorization` header value.
///
/// Returns `Ok(None)` when no credentials were presented (header absent or
/// blank). Never touches the network or the cache.
pub fn extract_bearer_token(header: Option<&[u8]>) -> Result<Option<BearerToken>> {
    let Some(raw) = header else {
        return Ok(None);
    };

    let value = std::str::from_utf8(raw)
        .map_err(|_| AuthError::malformed("header is not valid UTF-8"))?;

    let parts: Vec<&str> = value.split_ascii_whitespace().collect();

    match parts.as_slice() {
        [] => Ok(None),
        [scheme, ..] if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
            Err(AuthError::malformed("No Bearer Authorization header"))
        }
        [_] => Err(AuthError::malformed("No credentials provided")),
        [_, token] => Ok(Some(BearerToken::new(*token))),
        _ => Err(AuthError::malformed(
            "Credentials string should not contain spaces",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(header: &str) -> Result<Option<BearerToken>> {
        extract_bearer_token(Some(header.as_bytes()))
    }

    #[test]
    fn test_missing_header() {
        assert!(extract_bearer_token(None).unwrap().is_none());
    }

    #[test]
    fn test_blank_header_is_anonymous() {
        assert!(extract("").unwrap().is_none());
        assert!(extract("   ").unwrap().is_none());
    }

    #[test]
    fn test_valid_bearer() {
        let token = extract("Bearer abc.def.ghi").unwrap().unwrap();
        assert_eq!(token.expose(), "abc.def.ghi");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        for header in ["bearer T1", "BEARER T1", "BeArEr T1"] {
            let token = extract(header).unwrap().unwrap();
            assert_eq!(token.expose(), "T1");
        }
    }

    #[test]
    fn test_extra_whitespace_between_parts() {
        let token = extract("Bearer    T1  ").unwrap().unwrap();
        assert_eq!(token.expose(), "T1");
    }

    #[test]
    fn test_non_bearer_scheme() {
        let err = extract("Basic dXNlcjpwYXNz").unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthHeader(_)));
        assert!(err.to_string().contains("No Bearer"));
    }

    #[test]
    fn test_token_without_scheme() {
        let err = extract("abc.def.ghi").unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthHeader(_)));
    }

    #[test]
    fn test_scheme_only() {
        let err = extract("Bearer").unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthHeader(_)));
        assert!(err.to_string().contains("No credentials"));
    }

    #[test]
    fn test_too_many_parts() {
        let err = extract("Bearer abc def").unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthHeader(_)));
        assert!(err.to_string().contains("spaces"));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = extract_bearer_token(Some(&[0x42, 0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, AuthError::MalformedAuthHeader(_)));
    }
}
