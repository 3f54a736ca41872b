use hmac::{Hmac, Mac};
use obr_common::Secret;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Base64-encoded HMAC-SHA256 over `data`, as Shopify computes webhook signatures.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

/// The webhook signature gate.
///
/// A connector without a webhook secret runs in permissive mode: every delivery is accepted.
/// With a secret set, the signature must be the base64 HMAC-SHA256 of the *exact raw body bytes*
/// as received; the comparison is constant-time. A malformed signature is a plain `false`, never
/// an error.
pub fn verify_webhook_signature(body: &[u8], provided_signature: &str, secret: Option<&Secret<String>>) -> bool {
    let secret = match secret.map(|s| s.reveal().as_str()) {
        Some(s) if !s.is_empty() => s,
        _ => return true,
    };
    let provided = match base64::decode(provided_signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(body);
    // verify_slice is the constant-time comparison.
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "hush";
    const BODY: &[u8] = br#"{"id": 42, "financial_status": "paid"}"#;

    fn secret() -> Secret<String> {
        Secret::new(SECRET.to_string())
    }

    #[test]
    fn valid_signature_passes() {
        let sig = calculate_hmac(SECRET, BODY);
        assert!(verify_webhook_signature(BODY, &sig, Some(&secret())));
    }

    #[test]
    fn any_bit_flip_fails() {
        let sig = calculate_hmac(SECRET, BODY);
        // Flip one bit in the body.
        let mut body = BODY.to_vec();
        body[10] ^= 0x01;
        assert!(!verify_webhook_signature(&body, &sig, Some(&secret())));
        // Flip one bit in the signature.
        let mut raw = base64::decode(&sig).unwrap();
        raw[0] ^= 0x01;
        let tampered = base64::encode(raw);
        assert!(!verify_webhook_signature(BODY, &tampered, Some(&secret())));
    }

    #[test]
    fn malformed_signature_is_false_not_an_error() {
        assert!(!verify_webhook_signature(BODY, "not base64 at all!!", Some(&secret())));
        assert!(!verify_webhook_signature(BODY, "", Some(&secret())));
    }

    #[test]
    fn missing_secret_is_permissive() {
        assert!(verify_webhook_signature(BODY, "anything", None));
        assert!(verify_webhook_signature(BODY, "anything", Some(&Secret::new(String::new()))));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = calculate_hmac("other", BODY);
        assert!(!verify_webhook_signature(BODY, &sig, Some(&secret())));
    }
}
