//! URL-safe reversible encoding for RelayState tokens.
//!
//! The relay target is percent-encoded, base64-encoded, and the three
//! URL-hostile base64 characters are substituted (`/`→`_`, `+`→`-`, `=`→`.`).
//! The resulting alphabet needs no escaping as a query-string value and is
//! untouched by intermediate URL-encoding layers, so tokens survive any
//! number of transport hops.
//!
//! RelayState is attacker-controlled: decoded values must pass
//! [`safe_target`] before use as a `Location` header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use thiserror::Error;

/// Relay token decoding/validation errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("relay token is not valid UTF-8")]
    Utf8,

    #[error("relay target is not a relative path")]
    UnsafeTarget,
}

/// Encode an opaque relay string into a URL-safe token.
#[must_use]
pub fn encode(value: &str) -> String {
    let escaped = utf8_percent_encode(value, NON_ALPHANUMERIC).to_string();
    STANDARD
        .encode(escaped.as_bytes())
        .replace('/', "_")
        .replace('+', "-")
        .replace('=', ".")
}

/// Decode a token produced by [`encode`] back into the original string.
pub fn decode(token: &str) -> Result<String, RelayError> {
    let b64 = token.replace('_', "/").replace('-', "+").replace('.', "=");
    let bytes = STANDARD.decode(b64)?;
    let escaped = String::from_utf8(bytes).map_err(|_| RelayError::Utf8)?;
    percent_decode_str(&escaped)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| RelayError::Utf8)
}

/// Validate a decoded relay target before it becomes a redirect `Location`.
///
/// Only relative paths are accepted: a leading `/` that is not `//` (which
/// browsers treat as scheme-relative) and no backslashes. Anything else is
/// rejected to close the open-redirect hole.
pub fn safe_target(target: &str) -> Result<&str, RelayError> {
    if target.starts_with('/') && !target.starts_with("//") && !target.contains('\\') {
        Ok(target)
    } else {
        Err(RelayError::UnsafeTarget)
    }
}

/// Percent-escape a value for embedding in a query string.
#[must_use]
pub(crate) fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_reserved_characters() {
        for input in [
            "/profile",
            "/x?a=b&c=d#frag",
            "/path with spaces/and+plus",
            "https://example.com/?q=1%202",
            "ünïcode/πath",
            "",
        ] {
            assert_eq!(decode(&encode(input)).unwrap(), input, "{input:?}");
        }
    }

    #[test]
    fn test_token_alphabet_is_url_safe() {
        let token = encode("/x?a=b&c=d/e+f=g");
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')));
    }

    #[test]
    fn test_token_survives_intermediate_url_encoding() {
        let token = encode("/target?next=/other");
        // Simulate a transport hop that escapes and later unescapes the value.
        let escaped = utf8_percent_encode(&token, NON_ALPHANUMERIC).to_string();
        let unescaped = percent_decode_str(&escaped).decode_utf8().unwrap();
        assert_eq!(decode(&unescaped).unwrap(), "/target?next=/other");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("not!!valid@@token").is_err());
    }

    #[test]
    fn test_safe_target_accepts_relative_paths() {
        assert_eq!(safe_target("/profile").unwrap(), "/profile");
        assert_eq!(safe_target("/a/b?c=d").unwrap(), "/a/b?c=d");
    }

    #[test]
    fn test_safe_target_rejects_absolute_and_scheme_relative() {
        assert!(safe_target("https://evil.example.com/").is_err());
        assert!(safe_target("//evil.example.com/").is_err());
        assert!(safe_target("javascript:alert(1)").is_err());
        assert!(safe_target("/\\evil").is_err());
        assert!(safe_target("").is_err());
    }
}
