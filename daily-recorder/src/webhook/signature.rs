//! Webhook signature verification.
//!
//! The provider signs each delivery with HMAC-SHA256 over the exact raw
//! request body, keyed with the subscription secret, and sends the hex
//! digest in `x-daily-signature` (or `x-signature`), optionally prefixed
//! with `sha256=`.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Headers the signature may arrive in, in lookup order.
pub const SIGNATURE_HEADERS: &[&str] = &["x-daily-signature", "x-signature"];

const ALGORITHM_PREFIX: &str = "sha256=";

/// How an accepted event was authenticated. Recorded on every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Signature checked against the configured secret
    Verified,
    /// No secret configured; signature not checked
    Unverified,
}

impl Verification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Verified => "verified",
            Verification::Unverified => "unverified",
        }
    }
}

/// Verify a webhook signature against the raw body.
///
/// Returns `false` on any malformed input: empty secret, empty header,
/// non-hex digest, or a digest of the wrong length. The digest comparison
/// is constant-time.
pub fn verify_signature(raw_body: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    if secret.is_empty() || signature_header.trim().is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature_header.trim().is_empty(),
            "webhook_signature_missing_fields"
        );
        return false;
    }

    let supplied_hex = strip_algorithm_prefix(signature_header.trim());

    let supplied = match hex::decode(supplied_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(signature_length = supplied_hex.len(), "webhook_signature_not_hex");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };
    mac.update(raw_body);

    // verify_slice rejects length mismatches and compares in constant time
    let valid = mac.verify_slice(&supplied).is_ok();

    if !valid {
        warn!(
            expected_length = 32,
            actual_length = supplied.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Compute the hex digest the provider would send for `raw_body`.
pub fn compute_signature(raw_body: &[u8], secret: &[u8]) -> String {
    // HMAC accepts keys of any length, including empty
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// Pull the signature out of whichever supported header is present.
pub fn signature_from_headers(headers: &HeaderMap) -> Option<&str> {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
}

/// Check if signature verification is enabled.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

fn strip_algorithm_prefix(header: &str) -> &str {
    match header.get(..ALGORITHM_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(ALGORITHM_PREFIX) => {
            &header[ALGORITHM_PREFIX.len()..]
        }
        _ => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const BODY: &[u8] = br#"{"type":"recording.started","payload":{"room_name":"demo"}}"#;

    #[test]
    fn test_verify_signature_valid() {
        let signature = compute_signature(BODY, b"secret");
        assert!(verify_signature(BODY, &signature, b"secret"));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let signature = compute_signature(BODY, b"other-secret");
        assert!(!verify_signature(BODY, &signature, b"secret"));
    }

    #[test]
    fn test_verify_signature_prefix_insensitive() {
        let bare = compute_signature(BODY, b"secret");
        let prefixed = format!("sha256={bare}");
        let upper = format!("SHA256={bare}");

        assert!(verify_signature(BODY, &bare, b"secret"));
        assert!(verify_signature(BODY, &prefixed, b"secret"));
        assert!(verify_signature(BODY, &upper, b"secret"));
    }

    #[test]
    fn test_verify_signature_uses_raw_bytes() {
        // Same JSON, different whitespace: must not verify
        let signature = compute_signature(BODY, b"secret");
        let reformatted = br#"{ "type": "recording.started", "payload": { "room_name": "demo" } }"#;
        assert!(!verify_signature(reformatted, &signature, b"secret"));
    }

    #[test]
    fn test_verify_signature_malformed_inputs() {
        let signature = compute_signature(BODY, b"secret");

        assert!(!verify_signature(BODY, "", b"secret"));
        assert!(!verify_signature(BODY, "   ", b"secret"));
        assert!(!verify_signature(BODY, &signature, b""));
        assert!(!verify_signature(BODY, "not-hex-at-all", b"secret"));
        assert!(!verify_signature(BODY, "sha256=", b"secret"));
        assert!(!verify_signature(BODY, &signature[..40], b"secret"));
        assert!(!verify_signature(BODY, &format!("{signature}00"), b"secret"));
    }

    #[test]
    fn test_verify_signature_empty_body() {
        let signature = compute_signature(b"", b"secret");
        assert!(verify_signature(b"", &signature, b"secret"));
        assert!(!verify_signature(b"", &compute_signature(BODY, b"secret"), b"secret"));
    }

    #[test]
    fn test_signature_from_headers_order() {
        let mut headers = HeaderMap::new();
        assert_eq!(signature_from_headers(&headers), None);

        headers.insert("x-signature", HeaderValue::from_static("fallback"));
        assert_eq!(signature_from_headers(&headers), Some("fallback"));

        headers.insert("x-daily-signature", HeaderValue::from_static("primary"));
        assert_eq!(signature_from_headers(&headers), Some("primary"));
    }

    #[test]
    fn test_is_signature_verification_enabled() {
        assert!(!is_signature_verification_enabled(&None));
        assert!(!is_signature_verification_enabled(&Some("".to_string())));
        assert!(!is_signature_verification_enabled(&Some("   ".to_string())));
        assert!(is_signature_verification_enabled(&Some("key123".to_string())));
    }
}
