//! Webhook signing and digest helpers.
//!
//! Outbound webhooks are signed with HMAC-SHA256 over the exact JSON bytes
//! of the payload. Receivers recompute the signature from the raw request
//! body and compare it against the [`SIGNATURE_HEADER`] value, so the bytes
//! must never be re-serialized between signing and sending.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// HTTP header carrying the hex-encoded payload signature.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 signature for a webhook payload.
///
/// The `secret` is the service-wide webhook signing secret. The `payload` is
/// the JSON body exactly as it goes on the wire. Returns the hex-encoded
/// signature string.
pub fn compute_webhook_hmac(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    hex_encode(result.into_bytes())
}

/// Compute the SHA-256 hex digest of arbitrary bytes.
///
/// Used for API key storage: the plaintext key is never persisted, only this
/// digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let hash = hasher.finalize();
    format!("{hash:x}")
}

// ---------------------------------------------------------------------------
// hex encoding helper (no extra dep)
// ---------------------------------------------------------------------------

/// Encode bytes as a lowercase hex string.
fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- HMAC signing ------------------------------------------------------

    #[test]
    fn hmac_produces_hex_string() {
        let sig = compute_webhook_hmac("my_secret", r#"{"status":"completed"}"#);
        assert_eq!(sig.len(), 64, "HMAC-SHA256 hex should be 64 chars");
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hmac_matches_rfc_4231_case_2() {
        let sig = compute_webhook_hmac("Jefe", "what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hmac_is_deterministic() {
        let a = compute_webhook_hmac("secret", "payload");
        let b = compute_webhook_hmac("secret", "payload");
        assert_eq!(a, b);
    }

    #[test]
    fn hmac_differs_with_different_secret() {
        let a = compute_webhook_hmac("secret_a", "payload");
        let b = compute_webhook_hmac("secret_b", "payload");
        assert_ne!(a, b);
    }

    #[test]
    fn hmac_differs_with_different_payload() {
        let a = compute_webhook_hmac("secret", "payload_a");
        let b = compute_webhook_hmac("secret", "payload_b");
        assert_ne!(a, b);
    }

    // -- SHA-256 digest ----------------------------------------------------

    #[test]
    fn sha256_of_empty_input_matches_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_is_lowercase_hex() {
        let digest = sha256_hex(b"hark");
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
